//! Routes decoded agent frames onto the conversation log.
//!
//! Every frame is attributed to the head of [`PendingReplies`], never to the
//! newest log entry: the log may hold later, unrelated turns. This relies on
//! the agent answering turns in the order they were sent.

use tracing::{debug, warn};

use crate::audio::AudioSink;
use crate::conversation::{ChatEntry, ConversationLog};
use crate::messages::ServerFrame;
use crate::tracker::PendingReplies;

pub struct Dispatcher<'a> {
    pub log: &'a mut ConversationLog,
    pub pending: &'a mut PendingReplies,
    pub audio: &'a mut dyn AudioSink,
    /// Shown when an ACK carries no text.
    pub ack_default: &'a str,
}

impl Dispatcher<'_> {
    pub fn dispatch(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::Ack { status, text } => self.on_ack(&status, text.as_deref()),
            ServerFrame::Token(fragment) => self.on_token(&fragment),
            ServerFrame::Audio(payload) => self.on_audio(payload.as_deref()),
            ServerFrame::Unknown(kind) => debug!(%kind, "ignoring frame of unknown kind"),
        }
    }

    /// Terminal: the turn produced no stream. Replaces the head's text.
    fn on_ack(&mut self, status: &str, text: Option<&str>) {
        debug!(status, "agent acknowledged entry");
        let text = text.unwrap_or(self.ack_default);

        let Some(head) = self.pending.peek() else {
            self.log.push(ChatEntry::assistant(text));
            return;
        };
        if !self.log.replace_text(head, text) {
            debug!(entry = %head, "pending entry left the log, appending ack");
            self.log.push(ChatEntry::assistant(text));
        }
        self.pending.dequeue();
    }

    /// One increment of a streamed reply.
    fn on_token(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }

        match self.pending.peek() {
            Some(head) => {
                if !self.log.append_text(head, fragment) {
                    debug!(entry = %head, "pending entry left the log, starting a new reply");
                    let id = self.log.push(ChatEntry::assistant(fragment));
                    self.pending.replace_head(id);
                }
            }
            None => {
                let id = self.log.push(ChatEntry::assistant(fragment));
                self.pending.enqueue(id);
            }
        }
    }

    /// Terminal: speech for the finished reply. Text is left as streamed.
    fn on_audio(&mut self, payload: Option<&str>) {
        match payload {
            Some(payload) => {
                if let Err(e) = self.audio.play(payload) {
                    warn!(error = %e, "failed to play audio reply");
                }
            }
            None => warn!("audio frame without a payload"),
        }
        if let Some(id) = self.pending.dequeue() {
            debug!(entry = %id, "reply complete");
        }
    }
}
