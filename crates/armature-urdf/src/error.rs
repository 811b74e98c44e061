//! URDF parsing and validation errors.

use std::error::Error;
use std::fmt;

/// Errors from loading, parsing, or validating a robot description.
#[derive(Clone, Debug, PartialEq)]
pub enum UrdfError {
    /// The file could not be read.
    Io {
        /// Path that was opened.
        path: String,
        /// Operating-system error text.
        message: String,
    },
    /// The document is not well-formed XML.
    Xml {
        /// Parser error text.
        message: String,
    },
    /// A required element is absent.
    MissingElement {
        /// Element that was expected.
        element: &'static str,
        /// Where it was expected.
        context: String,
    },
    /// A required attribute is absent.
    MissingAttribute {
        /// Attribute that was expected.
        attribute: &'static str,
        /// Element it was expected on.
        element: String,
    },
    /// An attribute failed numeric parsing.
    InvalidNumber {
        /// Attribute holding the text.
        attribute: &'static str,
        /// Element the attribute is on.
        element: String,
        /// The unparseable text.
        text: String,
    },
    /// A joint declares a type this parser does not model.
    UnknownJointType {
        /// Name of the joint.
        joint: String,
        /// The declared type string.
        value: String,
    },
    /// Two links share a name.
    DuplicateLink {
        /// The repeated name.
        name: String,
    },
    /// Two joints share a name.
    DuplicateJoint {
        /// The repeated name.
        name: String,
    },
    /// A joint references a link that is not declared.
    DanglingLink {
        /// The referencing joint.
        joint: String,
        /// The undeclared link name.
        link: String,
    },
    /// A link is the child of more than one joint.
    LinkHasTwoParents {
        /// The over-referenced link.
        link: String,
    },
    /// Every link is some joint's child, so no root exists.
    NoRoot,
    /// More than one link has no parent joint.
    MultipleRoots {
        /// First parentless link found.
        first: String,
        /// Second parentless link found.
        second: String,
    },
    /// A link moved by a joint carries no usable inertial data.
    MissingInertial {
        /// The massless link.
        link: String,
    },
}

impl fmt::Display for UrdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read '{path}': {message}"),
            Self::Xml { message } => write!(f, "malformed XML: {message}"),
            Self::MissingElement { element, context } => {
                write!(f, "missing <{element}> in {context}")
            }
            Self::MissingAttribute { attribute, element } => {
                write!(f, "missing attribute '{attribute}' on <{element}>")
            }
            Self::InvalidNumber {
                attribute,
                element,
                text,
            } => {
                write!(
                    f,
                    "attribute '{attribute}' on <{element}> is not numeric: '{text}'"
                )
            }
            Self::UnknownJointType { joint, value } => {
                write!(f, "joint '{joint}' has unsupported type '{value}'")
            }
            Self::DuplicateLink { name } => write!(f, "duplicate link '{name}'"),
            Self::DuplicateJoint { name } => write!(f, "duplicate joint '{name}'"),
            Self::DanglingLink { joint, link } => {
                write!(f, "joint '{joint}' references undeclared link '{link}'")
            }
            Self::LinkHasTwoParents { link } => {
                write!(f, "link '{link}' is the child of more than one joint")
            }
            Self::NoRoot => write!(f, "kinematic tree has no root link"),
            Self::MultipleRoots { first, second } => {
                write!(
                    f,
                    "kinematic tree has multiple roots: '{first}' and '{second}'"
                )
            }
            Self::MissingInertial { link } => {
                write!(f, "articulated link '{link}' has no positive-mass <inertial>")
            }
        }
    }
}

impl Error for UrdfError {}
