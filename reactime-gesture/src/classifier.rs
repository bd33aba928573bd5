//! Collaborator seams: where frames come from and how they are scored.

use crate::error::{ClassifierError, InitError};
use reactime_core::Scores;
use std::future::Future;
use std::pin::Pin;
use tracing::{info, warn};

/// Per-frame gesture scorer, e.g. a face-landmark model emitting blendshapes.
pub trait Classifier {
    type Frame;
    fn classify(&mut self, frame: &Self::Frame, at: u64) -> Result<Scores, ClassifierError>;
}

/// A camera-like stream.
pub trait FrameSource {
    type Frame;
    fn playing(&self) -> bool;
    /// The current frame, or `None` while no decodable frame is available yet.
    fn frame(&mut self) -> Option<Self::Frame>;
}

pub type LoadFuture<'a, C> = Pin<Box<dyn Future<Output = Result<C, ClassifierError>> + 'a>>;

/// One way of constructing a classifier, such as one model URL.
pub trait ModelSource<C> {
    fn describe(&self) -> String;
    fn load(&self) -> LoadFuture<'_, C>;
}

/// Tries each source in order and returns the first classifier that loads,
/// with the description of the source it came from.
pub async fn load_first<C>(sources: &[Box<dyn ModelSource<C>>]) -> Result<(C, String), InitError> {
    if sources.is_empty() {
        return Err(InitError::NoSources);
    }
    let mut attempts = Vec::new();
    for source in sources {
        let name = source.describe();
        match source.load().await {
            Ok(classifier) => {
                info!("Classifier loaded from {}", name);
                return Ok((classifier, name));
            }
            Err(err) => {
                warn!("Classifier source {} failed: {}", name, err);
                attempts.push((name, err));
            }
        }
    }
    Err(InitError::AllSourcesFailed { attempts })
}


#[cfg(test)]
mod tests {
    use super::testing::{EchoClassifier, FixedSource};
    use super::*;

    fn sources(entries: &[(&'static str, bool)]) -> Vec<Box<dyn ModelSource<EchoClassifier>>> {
        entries
            .iter()
            .map(|&(name, ok)| Box::new(FixedSource { name, ok }) as Box<dyn ModelSource<_>>)
            .collect()
    }

    #[test]
    fn first_successful_source_wins() {
        let list = sources(&[("primary", false), ("mirror", true), ("backup", true)]);
        let (_, name) = pollster::block_on(load_first(&list)).unwrap();
        assert_eq!(name, "mirror");
    }

    #[test]
    fn all_failures_aggregate() {
        let list = sources(&[("primary", false), ("mirror", false)]);
        let err = pollster::block_on(load_first(&list)).err().unwrap();
        match err {
            InitError::AllSourcesFailed { attempts } => {
                let names: Vec<_> = attempts.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["primary", "mirror"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_source_list_is_an_error() {
        let list = sources(&[]);
        assert_eq!(
            pollster::block_on(load_first(&list)).err(),
            Some(InitError::NoSources)
        );
    }
}
