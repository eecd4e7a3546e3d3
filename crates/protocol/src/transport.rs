//! Collaborator contracts.
//!
//! The client does not own a connection. Outbound feedback goes through a
//! [`FeedbackSink`]; frame tracking is requested through a
//! [`TransformSubscriber`] and the host pushes transform updates back in.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::InteractiveMarkerFeedback;

/// Destination for outbound feedback messages (the feedback topic).
pub trait FeedbackSink {
    fn publish(&mut self, feedback: InteractiveMarkerFeedback) -> ProtocolResult<()>;
}

impl FeedbackSink for mpsc::UnboundedSender<InteractiveMarkerFeedback> {
    fn publish(&mut self, feedback: InteractiveMarkerFeedback) -> ProtocolResult<()> {
        self.send(feedback).map_err(|_| ProtocolError::ChannelClosed)
    }
}

/// Records every message; handy for hosts that batch and for tests.
impl FeedbackSink for Vec<InteractiveMarkerFeedback> {
    fn publish(&mut self, feedback: InteractiveMarkerFeedback) -> ProtocolResult<()> {
        self.push(feedback);
        Ok(())
    }
}

/// Transform-lookup collaborator: tracks which frames the client wants
/// live updates for.
pub trait TransformSubscriber {
    fn subscribe(&mut self, frame_id: &str);
    fn unsubscribe(&mut self, frame_id: &str);
}

/// Reference-counted set of subscribed frames.
///
/// Several markers may share a frame; the frame stays subscribed until the
/// last of them unsubscribes.
#[derive(Debug, Clone, Default)]
pub struct FrameSubscriptions {
    counts: HashMap<String, usize>,
}

impl FrameSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self, frame_id: &str) -> bool {
        self.counts.contains_key(frame_id)
    }

    pub fn count(&self, frame_id: &str) -> usize {
        self.counts.get(frame_id).copied().unwrap_or(0)
    }

    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

impl TransformSubscriber for FrameSubscriptions {
    fn subscribe(&mut self, frame_id: &str) {
        *self.counts.entry(frame_id.to_string()).or_insert(0) += 1;
        tracing::debug!("Subscribed to frame {}", frame_id);
    }

    fn unsubscribe(&mut self, frame_id: &str) {
        let Some(count) = self.counts.get_mut(frame_id) else {
            tracing::warn!("Unsubscribe from untracked frame {}", frame_id);
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(frame_id);
            tracing::debug!("Unsubscribed from frame {}", frame_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Header, PointMsg, PoseMsg};

    fn feedback() -> InteractiveMarkerFeedback {
        InteractiveMarkerFeedback {
            header: Header::new("base_link"),
            client_id: "test".into(),
            marker_name: "m".into(),
            control_name: "c".into(),
            event_type: 1,
            pose: PoseMsg::default(),
            menu_entry_id: 0,
            mouse_point: PointMsg::default(),
            mouse_point_valid: false,
        }
    }

    #[test]
    fn test_channel_sink_delivers() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        tx.publish(feedback()).unwrap();
        assert_eq!(rx.try_recv().unwrap().marker_name, "m");
    }

    #[test]
    fn test_closed_channel_is_an_error() {
        let (mut tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        assert!(matches!(tx.publish(feedback()), Err(ProtocolError::ChannelClosed)));
    }

    #[test]
    fn test_frame_subscriptions_are_reference_counted() {
        let mut subs = FrameSubscriptions::new();
        subs.subscribe("base_link");
        subs.subscribe("base_link");
        assert_eq!(subs.count("base_link"), 2);

        subs.unsubscribe("base_link");
        assert!(subs.is_subscribed("base_link"));
        subs.unsubscribe("base_link");
        assert!(!subs.is_subscribed("base_link"));

        // unknown frames are ignored
        subs.unsubscribe("map");
        assert_eq!(subs.frames().count(), 0);
    }
}
