use std::fmt;

use serde::Serialize;

/// Lifecycle tag broadcast to the progress sink. Purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessStatus {
    /// One token of a list is being approved; detail carries the token id.
    ApprovingToken,
    MintingBundle,
    /// The hardware device is about to be asked for a signature.
    NeedASign,
    /// A transaction was broadcast; detail carries its hash.
    WaitTransactionResult,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::ApprovingToken => "approving-token",
            ProcessStatus::MintingBundle => "minting-bundle",
            ProcessStatus::NeedASign => "need-a-sign",
            ProcessStatus::WaitTransactionResult => "wait-transaction-result",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives `(status, detail)` events.
pub trait ProgressSink: Send + Sync {
    fn report(&self, status: ProcessStatus, detail: Option<String>);
}

impl<F> ProgressSink for F
where
    F: Fn(ProcessStatus, Option<String>) + Send + Sync,
{
    fn report(&self, status: ProcessStatus, detail: Option<String>) {
        self(status, detail)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn report(&self, _status: ProcessStatus, _detail: Option<String>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn wire_tags() {
        assert_eq!(ProcessStatus::ApprovingToken.to_string(), "approving-token");
        assert_eq!(
            serde_json::to_string(&ProcessStatus::WaitTransactionResult).unwrap(),
            "\"wait-transaction-result\""
        );
        assert_eq!(
            serde_json::to_string(&ProcessStatus::NeedASign).unwrap(),
            format!("\"{}\"", ProcessStatus::NeedASign.as_str())
        );
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |status: ProcessStatus, detail: Option<String>| {
            seen.lock().unwrap().push((status, detail));
        };
        sink.report(ProcessStatus::ApprovingToken, Some("7".into()));
        SilentProgress.report(ProcessStatus::MintingBundle, None);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, vec![(ProcessStatus::ApprovingToken, Some("7".to_string()))]);
    }
}
