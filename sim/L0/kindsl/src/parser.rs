//! URDF XML parser.
//!
//! Parses URDF XML into the intermediate representation types. Only the
//! elements that carry kinematic or inertial information are interpreted;
//! visual, collision, material, transmission and vendor extensions are
//! skipped.

use std::fs;
use std::io::BufRead;
use std::path::Path;

use nalgebra::Vector3;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, UrdfError};
use crate::types::{UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointType, UrdfLink, UrdfOrigin, UrdfRobot};

/// Parse a URDF string into a robot model.
///
/// # Errors
///
/// Returns an error if the XML is malformed or missing required elements.
pub fn parse_urdf_str(xml: &str) -> Result<UrdfRobot> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    parse_urdf_reader(&mut reader)
}

/// Parse a URDF file into a robot model.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn parse_urdf_file(path: impl AsRef<Path>) -> Result<UrdfRobot> {
    let content = fs::read_to_string(path)?;
    parse_urdf_str(&content)
}

/// Parse URDF from a reader.
fn parse_urdf_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<UrdfRobot> {
    let mut buf = Vec::new();
    let mut robot: Option<UrdfRobot> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"robot" => {
                robot = Some(parse_robot(reader, e)?);
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"robot" => {
                robot = Some(UrdfRobot::new(get_attribute(e, "name")?));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    robot.ok_or_else(|| UrdfError::missing_element("robot", "URDF document"))
}

/// Parse the robot element and its children.
fn parse_robot<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfRobot> {
    let name = get_attribute(start, "name")?;
    let mut robot = UrdfRobot::new(name);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"link" => {
                        let link = parse_link(reader, e)?;
                        robot.links.push(link);
                    }
                    b"joint" => {
                        let joint = parse_joint(reader, e)?;
                        robot.joints.push(joint);
                    }
                    // Skip material, transmission, gazebo, and other elements
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                // Empty link (just a name, no inertial)
                b"link" => robot.links.push(UrdfLink::new(get_attribute(e, "name")?)),
                b"joint" => {
                    let name = get_attribute(e, "name")?;
                    return Err(UrdfError::missing_element(
                        "parent",
                        format!("joint '{name}'"),
                    ));
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"robot" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in robot".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(robot)
}

/// Parse a link element.
fn parse_link<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfLink> {
    let name = get_attribute(start, "name")?;
    let mut link = UrdfLink::new(name);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"inertial" => {
                        link.inertial = Some(parse_inertial(reader, &link.name)?);
                    }
                    // visual, collision
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"link" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in link".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(link)
}

/// Parse an inertial element.
fn parse_inertial<R: BufRead>(reader: &mut Reader<R>, link_name: &str) -> Result<UrdfInertial> {
    let mut inertial = UrdfInertial::default();
    let mut mass: Option<f64> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => {
                    inertial.origin = parse_origin(e)?;
                }
                b"mass" => {
                    mass = Some(parse_mass(e)?);
                }
                b"inertia" => {
                    inertial.inertia = parse_inertia_element(e)?;
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"inertial" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in inertial".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    inertial.mass = mass.ok_or_else(|| {
        UrdfError::missing_element("mass", format!("inertial of link '{link_name}'"))
    })?;
    Ok(inertial)
}

/// Parse origin element attributes.
fn parse_origin(e: &BytesStart) -> Result<UrdfOrigin> {
    let xyz = get_attribute_opt(e, "xyz")
        .map(|s| parse_vector3(&s))
        .transpose()?
        .unwrap_or_else(Vector3::zeros);

    let rpy = get_attribute_opt(e, "rpy")
        .map(|s| parse_vector3(&s))
        .transpose()?
        .unwrap_or_else(Vector3::zeros);

    Ok(UrdfOrigin::new(xyz, rpy))
}

/// Parse mass element.
fn parse_mass(e: &BytesStart) -> Result<f64> {
    let value_str = get_attribute(e, "value")?;
    value_str
        .trim()
        .parse()
        .map_err(|_| UrdfError::invalid_attribute("value", "mass", "expected a number"))
}

/// Parse inertia element attributes.
fn parse_inertia_element(e: &BytesStart) -> Result<UrdfInertia> {
    Ok(UrdfInertia {
        ixx: parse_moment(e, "ixx")?,
        ixy: parse_moment(e, "ixy")?,
        ixz: parse_moment(e, "ixz")?,
        iyy: parse_moment(e, "iyy")?,
        iyz: parse_moment(e, "iyz")?,
        izz: parse_moment(e, "izz")?,
    })
}

/// Parse one inertia moment; absent moments are zero, malformed ones are errors.
fn parse_moment(e: &BytesStart, name: &'static str) -> Result<f64> {
    match get_attribute_opt(e, name) {
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| UrdfError::invalid_attribute(name, "inertia", "expected a number")),
        None => Ok(0.0),
    }
}

/// Parse a joint element.
fn parse_joint<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfJoint> {
    let name = get_attribute(start, "name")?;
    let type_str = get_attribute(start, "type")?;
    let joint_type =
        UrdfJointType::from_str(&type_str).ok_or_else(|| UrdfError::UnknownJointType(type_str))?;

    let mut parent: Option<String> = None;
    let mut child: Option<String> = None;
    let mut origin = UrdfOrigin::default();
    let mut axis = Vector3::x();

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"parent" => {
                        parent = Some(get_attribute(e, "link")?);
                    }
                    b"child" => {
                        child = Some(get_attribute(e, "link")?);
                    }
                    b"origin" => {
                        origin = parse_origin(e)?;
                    }
                    b"axis" => {
                        if let Some(xyz) = get_attribute_opt(e, "xyz") {
                            axis = parse_vector3(&xyz)?;
                        }
                    }
                    // limit, dynamics, mimic, calibration, safety_controller
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in joint".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    let parent =
        parent.ok_or_else(|| UrdfError::missing_element("parent", format!("joint '{name}'")))?;
    let child =
        child.ok_or_else(|| UrdfError::missing_element("child", format!("joint '{name}'")))?;

    Ok(UrdfJoint::new(name, joint_type, parent, child)
        .with_origin(origin)
        .with_axis(axis))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required attribute value.
fn get_attribute(e: &BytesStart, name: &'static str) -> Result<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec())
                .map_err(|_| UrdfError::invalid_attribute(name, element_name(e), "invalid UTF-8"));
        }
    }
    Err(UrdfError::missing_attribute(name, element_name(e)))
}

/// Get an optional attribute value.
fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

/// Parse a space-separated vector3 string.
fn parse_vector3(s: &str) -> Result<Vector3<f64>> {
    let parts: Vec<f64> = s
        .split_whitespace()
        .map(|p| p.parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| UrdfError::XmlParse(format!("invalid vector3: {s}")))?;

    if parts.len() != 3 {
        return Err(UrdfError::XmlParse(format!(
            "expected 3 values in vector, got {}: {s}",
            parts.len()
        )));
    }

    Ok(Vector3::new(parts[0], parts[1], parts[2]))
}

/// Get element name as string for error messages.
fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Skip an element and all its children.
fn skip_element<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => {
                depth += 1;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(())
}
