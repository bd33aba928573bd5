#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ClassifierError {
    #[error("model load failed: {0}")]
    Load(String),
    #[error("classification failed: {0}")]
    Classify(String),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum InitError {
    #[error("no model sources configured")]
    NoSources,
    #[error("all {} model sources failed: {}", .attempts.len(), describe_attempts(.attempts))]
    AllSourcesFailed {
        attempts: Vec<(String, ClassifierError)>,
    },
}

fn describe_attempts(attempts: &[(String, ClassifierError)]) -> String {
    attempts
        .iter()
        .map(|(source, err)| format!("{source}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_message_lists_every_source() {
        let err = InitError::AllSourcesFailed {
            attempts: vec![
                ("a.task".into(), ClassifierError::Load("404".into())),
                ("b.task".into(), ClassifierError::Load("corrupt".into())),
            ],
        };
        assert_eq!(
            err.to_string(),
            "all 2 model sources failed: a.task: model load failed: 404; b.task: model load failed: corrupt"
        );
    }
}
