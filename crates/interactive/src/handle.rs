//! Marker handle
//!
//! The boundary between one interactive marker and the server. Local
//! feedback becomes outbound [`InteractiveMarkerFeedback`] messages, and
//! authoritative poses and frame transforms become marker poses in the
//! scene's fixed frame.

use std::time::{Duration, Instant};

use glam::Vec3;
use marker_core::Pose;
use marker_protocol::{
    FeedbackEventType, FeedbackSink, Header, InteractiveMarkerFeedback, InteractiveMarkerMsg,
    PointMsg, ProtocolResult,
};

use crate::config::ClientConfig;
use crate::interactive_marker::{FeedbackEvent, FeedbackKind};

#[derive(Debug, Clone)]
struct PendingRepeat {
    due: Instant,
    event: FeedbackEvent,
}

#[derive(Debug, Clone)]
pub struct MarkerHandle {
    name: String,
    header: Header,
    client_id: String,
    /// Last known pose in the header frame
    pose: Pose,
    /// Header frame expressed in the fixed frame
    transform: Pose,
    dragging: bool,
    repeat: Option<PendingRepeat>,
    repeat_interval: Duration,
}

impl MarkerHandle {
    pub fn new(msg: &InteractiveMarkerMsg, config: &ClientConfig) -> Self {
        Self {
            name: msg.name.clone(),
            header: msg.header.clone(),
            client_id: config.client_id.clone(),
            pose: msg.pose.into(),
            transform: Pose::IDENTITY,
            dragging: false,
            repeat: None,
            repeat_interval: config.repeat_interval(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame_id(&self) -> &str {
        &self.header.frame_id
    }

    /// Whether the header frame should be tracked live.
    pub fn tracks_frame(&self) -> bool {
        self.header.tracks_frame()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn has_pending_repeat(&self) -> bool {
        self.repeat.is_some()
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn transform(&self) -> Pose {
        self.transform
    }

    /// Pose in the fixed frame, as the marker should display it.
    pub fn marker_pose(&self) -> Pose {
        self.pose.transformed_by(&self.transform)
    }

    /// Store an authoritative pose (header frame) and return it in the
    /// fixed frame.
    pub fn set_pose_from_server(&mut self, pose: Pose) -> Pose {
        self.pose = pose;
        self.marker_pose()
    }

    /// Store a new frame transform and return the re-transformed pose.
    pub fn on_transform(&mut self, transform: Pose) -> Pose {
        self.transform = transform;
        self.marker_pose()
    }

    pub fn cancel_repeat(&mut self) {
        self.repeat = None;
    }

    /// Publish the outbound message for a local feedback event.
    pub fn handle_feedback<S: FeedbackSink + ?Sized>(
        &mut self,
        event: &FeedbackEvent,
        now: Instant,
        sink: &mut S,
    ) -> ProtocolResult<()> {
        self.pose = event.pose.transformed_by(&self.transform.inverse());

        match event.kind {
            FeedbackKind::PoseChange => {
                if self.dragging {
                    self.repeat = Some(PendingRepeat {
                        due: now + self.repeat_interval,
                        event: event.clone(),
                    });
                }
                self.publish(FeedbackEventType::PoseUpdate, event, 0, None, sink)
            }
            FeedbackKind::MouseDown => {
                self.dragging = true;
                self.publish(FeedbackEventType::MouseDown, event, 0, event.mouse_point, sink)
            }
            FeedbackKind::MouseUp => {
                self.dragging = false;
                self.repeat = None;
                self.publish(FeedbackEventType::MouseUp, event, 0, event.mouse_point, sink)
            }
            FeedbackKind::ButtonClick => {
                self.publish(FeedbackEventType::ButtonClick, event, 0, event.mouse_point, sink)
            }
            FeedbackKind::MenuSelect(id) => {
                self.publish(FeedbackEventType::MenuSelect, event, id, None, sink)
            }
        }
    }

    /// Re-send the last pose if its repeat is due. Returns whether a
    /// message went out.
    pub fn poll<S: FeedbackSink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> ProtocolResult<bool> {
        if !self.repeat.as_ref().is_some_and(|r| r.due <= now) {
            return Ok(false);
        }
        let Some(repeat) = self.repeat.take() else {
            return Ok(false);
        };
        self.handle_feedback(&repeat.event, now, sink)?;
        Ok(true)
    }

    fn publish<S: FeedbackSink + ?Sized>(
        &self,
        event_type: FeedbackEventType,
        event: &FeedbackEvent,
        menu_entry_id: u32,
        mouse_point: Option<Vec3>,
        sink: &mut S,
    ) -> ProtocolResult<()> {
        let feedback = InteractiveMarkerFeedback {
            header: self.header.clone(),
            client_id: self.client_id.clone(),
            marker_name: self.name.clone(),
            control_name: event.control_name.clone(),
            event_type: event_type.into(),
            pose: self.pose.into(),
            menu_entry_id,
            mouse_point: mouse_point.map(PointMsg::from).unwrap_or_default(),
            mouse_point_valid: mouse_point.is_some(),
        };
        tracing::trace!("Feedback {:?} for {}/{}", event_type, self.name, event.control_name);
        sink.publish(feedback)
    }
}
