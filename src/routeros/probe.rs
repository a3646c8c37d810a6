// SPDX-License-Identifier: MIT

//! Single-round-trip status probe against a device

use thiserror::Error;

use super::pool::PooledSession;
use super::session::{Sentence, SessionError};

/// Metadata extracted from a successful probe
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub version: String,
    pub board_name: String,
    pub uptime: String,
}

/// A probe failure; the session that produced it must not be reused
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("unexpected system resource reply: {0}")]
    Malformed(String),
}

/// Issues one `/system/resource/print` and normalizes the reply
///
/// No retries here; a failure immediately surfaces to the caller, which is
/// expected to release the pooled session.
pub async fn probe(session: &mut PooledSession) -> Result<ProbeReport, ProbeError> {
    let sentences = session.command("/system/resource/print", &[]).await?;
    parse_report(&sentences)
}

fn parse_report(sentences: &[Sentence]) -> Result<ProbeReport, ProbeError> {
    let row = match sentences {
        [row] => row,
        [] => return Err(ProbeError::Malformed("empty reply".to_string())),
        more => {
            return Err(ProbeError::Malformed(format!(
                "expected one row, got {}",
                more.len()
            )));
        }
    };

    let version = row
        .get("version")
        .cloned()
        .ok_or_else(|| ProbeError::Malformed("missing version".to_string()))?;
    let board_name = row
        .get("board-name")
        .cloned()
        .ok_or_else(|| ProbeError::Malformed("missing board-name".to_string()))?;
    let uptime = row
        .get("uptime")
        .cloned()
        .unwrap_or_else(|| "unknown".to_string());

    Ok(ProbeReport {
        version,
        board_name,
        uptime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Sentence {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_report_complete() {
        let sentences = vec![row(&[
            ("version", "7.10.1"),
            ("board-name", "RB4011"),
            ("uptime", "1w2d3h4m5s"),
            ("cpu-load", "12"),
        ])];

        let report = parse_report(&sentences).unwrap();
        assert_eq!(report.version, "7.10.1");
        assert_eq!(report.board_name, "RB4011");
        assert_eq!(report.uptime, "1w2d3h4m5s");
    }

    #[test]
    fn test_parse_report_missing_uptime_is_tolerated() {
        let sentences = vec![row(&[("version", "7.10.1"), ("board-name", "RB4011")])];
        let report = parse_report(&sentences).unwrap();
        assert_eq!(report.uptime, "unknown");
    }

    #[test]
    fn test_parse_report_empty_reply() {
        let err = parse_report(&[]).unwrap_err();
        assert!(matches!(err, ProbeError::Malformed(_)));
    }

    #[test]
    fn test_parse_report_multiple_rows() {
        let sentences = vec![
            row(&[("version", "7.10.1"), ("board-name", "RB4011")]),
            row(&[("version", "6.49"), ("board-name", "hAP")]),
        ];
        let err = parse_report(&sentences).unwrap_err();
        assert!(matches!(err, ProbeError::Malformed(_)));
    }

    #[test]
    fn test_parse_report_missing_version() {
        let sentences = vec![row(&[("board-name", "RB4011")])];
        let err = parse_report(&sentences).unwrap_err();
        assert!(matches!(err, ProbeError::Malformed(_)));
    }
}
