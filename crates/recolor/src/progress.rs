//! Conversion progress reporting

/// Milestones of one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { pages: usize },
    /// `page` is 1-indexed
    PageDone { page: usize, pages: usize },
    Saving,
    Finished,
}

impl ProgressEvent {
    /// Completion in percent, when the event carries a position
    pub fn percent(&self) -> Option<u8> {
        match *self {
            ProgressEvent::Started { .. } => Some(0),
            ProgressEvent::PageDone { page, pages } if pages > 0 => {
                Some((page.min(pages) * 100 / pages) as u8)
            }
            ProgressEvent::Finished => Some(100),
            _ => None,
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink {
    fn event(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn event(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn event(&mut self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(ProgressEvent::Started { pages: 3 }.percent(), Some(0));
        assert_eq!(ProgressEvent::PageDone { page: 1, pages: 3 }.percent(), Some(33));
        assert_eq!(ProgressEvent::PageDone { page: 3, pages: 3 }.percent(), Some(100));
        assert_eq!(ProgressEvent::PageDone { page: 1, pages: 0 }.percent(), None);
        assert_eq!(ProgressEvent::Saving.percent(), None);
        assert_eq!(ProgressEvent::Finished.percent(), Some(100));
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |e: ProgressEvent| seen.push(e);
            sink.event(ProgressEvent::Saving);
        }
        assert_eq!(seen, vec![ProgressEvent::Saving]);
    }
}
