//! Wire protocol for interactive marker clients.
//!
//! This crate provides:
//! - Message types exchanged with the interactive marker server
//!   (rosbridge-style JSON)
//! - Mode and type codes with checked conversions
//! - Collaborator contracts for outbound feedback and frame tracking

pub mod error;
pub mod message;
pub mod modes;
pub mod transport;

pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    ColorRgba, Header, InteractiveMarkerControlMsg, InteractiveMarkerFeedback,
    InteractiveMarkerInit, InteractiveMarkerMsg, InteractiveMarkerPose, InteractiveMarkerUpdate,
    MarkerMsg, MenuEntryMsg, PointMsg, PoseMsg, QuaternionMsg, Time, TransformMsg,
};
pub use modes::{FeedbackEventType, InteractionMode, MarkerType, OrientationMode, UpdateType};
pub use transport::{FeedbackSink, FrameSubscriptions, TransformSubscriber};
