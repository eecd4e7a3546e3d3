//! Numeric codes carried on the wire and their typed counterparts.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// How a control reacts to the pointer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum InteractionMode {
    #[default]
    None = 0,
    Menu = 1,
    Button = 2,
    MoveAxis = 3,
    MovePlane = 4,
    RotateAxis = 5,
    MoveRotate = 6,
    Move3D = 7,
    Rotate3D = 8,
    MoveRotate3D = 9,
}

impl TryFrom<u8> for InteractionMode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Menu,
            2 => Self::Button,
            3 => Self::MoveAxis,
            4 => Self::MovePlane,
            5 => Self::RotateAxis,
            6 => Self::MoveRotate,
            7 => Self::Move3D,
            8 => Self::Rotate3D,
            9 => Self::MoveRotate3D,
            other => return Err(ProtocolError::UnknownInteractionMode(other)),
        })
    }
}

impl From<InteractionMode> for u8 {
    fn from(value: InteractionMode) -> Self {
        value as u8
    }
}

/// Which frame a control's orientation follows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum OrientationMode {
    /// Rotates together with the marker
    #[default]
    Inherit = 0,
    /// Keeps a constant world orientation
    Fixed = 1,
    /// Faces the camera every frame
    ViewFacing = 2,
}

impl TryFrom<u8> for OrientationMode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Inherit,
            1 => Self::Fixed,
            2 => Self::ViewFacing,
            other => return Err(ProtocolError::UnknownOrientationMode(other)),
        })
    }
}

impl From<OrientationMode> for u8 {
    fn from(value: OrientationMode) -> Self {
        value as u8
    }
}

/// Visual marker primitive type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MarkerType {
    Arrow = 0,
    Cube = 1,
    Sphere = 2,
    Cylinder = 3,
    LineStrip = 4,
    LineList = 5,
    CubeList = 6,
    SphereList = 7,
    Points = 8,
    TextViewFacing = 9,
    MeshResource = 10,
    TriangleList = 11,
}

impl TryFrom<i32> for MarkerType {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Arrow,
            1 => Self::Cube,
            2 => Self::Sphere,
            3 => Self::Cylinder,
            4 => Self::LineStrip,
            5 => Self::LineList,
            6 => Self::CubeList,
            7 => Self::SphereList,
            8 => Self::Points,
            9 => Self::TextViewFacing,
            10 => Self::MeshResource,
            11 => Self::TriangleList,
            other => return Err(ProtocolError::UnknownMarkerType(other)),
        })
    }
}

/// `event_type` of an outbound feedback message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FeedbackEventType {
    KeepAlive = 0,
    PoseUpdate = 1,
    MenuSelect = 2,
    ButtonClick = 3,
    MouseDown = 4,
    MouseUp = 5,
}

impl TryFrom<u8> for FeedbackEventType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::KeepAlive,
            1 => Self::PoseUpdate,
            2 => Self::MenuSelect,
            3 => Self::ButtonClick,
            4 => Self::MouseDown,
            5 => Self::MouseUp,
            other => return Err(ProtocolError::UnknownFeedbackEvent(other)),
        })
    }
}

impl From<FeedbackEventType> for u8 {
    fn from(value: FeedbackEventType) -> Self {
        value as u8
    }
}

/// `type` of an inbound update message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    KeepAlive,
    Update,
}

impl From<u8> for UpdateType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::KeepAlive,
            _ => Self::Update,
        }
    }
}
