//! Interactive marker controls.
//!
//! This crate provides:
//! - A scene graph of markers, controls and their visuals
//! - Pointer event routing with hover hand-off and drag pinning
//! - Controls with orientation modes and drag algorithms
//! - Reconciliation of local drags with authoritative server poses
//! - A client that keeps markers in sync with the server's update stream

pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod handle;
pub mod interactive_marker;
pub mod menu;
pub mod pointer;
pub mod scene;
pub mod visual;

pub use client::InteractiveMarkerClient;
pub use config::ClientConfig;
pub use control::{Control, ControlAction, DragMotion};
pub use error::{ClientError, Result};
pub use handle::MarkerHandle;
pub use interactive_marker::{DragSession, FeedbackEvent, FeedbackKind, InteractiveMarker};
pub use menu::{Menu, MenuEntry, MenuSelection, OpenMenu};
pub use pointer::{DispatchOutcome, EventSink, PointerEvent, PointerRouter};
pub use scene::{Intersection, MarkerId, Node, NodeId, NodeTag, SceneGraph};
pub use visual::{ListShape, MarkerVisual, Primitive, VisualOptions};
