//! Error types for URDF parsing and Kinematics-DSL conversion.

use thiserror::Error;

/// Errors that can occur while reading a URDF model or converting it.
#[derive(Debug, Error)]
pub enum UrdfError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Missing required element.
    #[error("missing required element: {element} in {context}")]
    MissingElement {
        /// The missing element name.
        element: &'static str,
        /// Where the element was expected.
        context: String,
    },

    /// Missing required attribute.
    #[error("missing required attribute: {attribute} on {element}")]
    MissingAttribute {
        /// The missing attribute name.
        attribute: &'static str,
        /// The element that should have the attribute.
        element: String,
    },

    /// Invalid attribute value.
    #[error("invalid value for {attribute} on {element}: {message}")]
    InvalidAttribute {
        /// The attribute with the invalid value.
        attribute: &'static str,
        /// The element containing the attribute.
        element: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// Unknown joint type.
    #[error("unknown joint type: {0}")]
    UnknownJointType(String),

    /// Reference to undefined link.
    #[error("reference to undefined link: {link_name} in {context}")]
    UndefinedLink {
        /// The link name that was referenced.
        link_name: String,
        /// The joint (or request) that referenced it.
        context: String,
    },

    /// Duplicate link name, after identifier sanitizing.
    #[error("duplicate link name: {0}")]
    DuplicateLink(String),

    /// Duplicate joint name, after identifier sanitizing.
    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    /// A link is the child of more than one joint.
    #[error("link '{link_name}' has multiple parent joints ('{first}' and '{second}')")]
    MultipleParents {
        /// The link with more than one parent.
        link_name: String,
        /// The joint that first claimed the link.
        first: String,
        /// The joint that claimed it again.
        second: String,
    },

    /// Kinematic loop detected.
    #[error("kinematic loop detected: {0}")]
    KinematicLoop(String),

    /// No root link found.
    #[error("no root link found (all links are children of joints); check for kinematic loops")]
    NoRootLink,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported feature.
    #[error("unsupported URDF feature: {0}")]
    Unsupported(String),
}

impl UrdfError {
    /// Create a missing element error.
    pub fn missing_element(element: &'static str, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element,
            context: context.into(),
        }
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(attribute: &'static str, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(
        attribute: &'static str,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            attribute,
            element: element.into(),
            message: message.into(),
        }
    }

    /// Create an undefined link error.
    pub fn undefined_link(link_name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UndefinedLink {
            link_name: link_name.into(),
            context: context.into(),
        }
    }

    /// Create a multiple parents error.
    pub fn multiple_parents(
        link_name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::MultipleParents {
            link_name: link_name.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}

/// Result type for URDF operations.
pub type Result<T> = std::result::Result<T, UrdfError>;
