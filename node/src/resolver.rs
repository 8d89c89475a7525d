//! TXT record lookups over DNS-over-HTTPS (JSON API)
//!
//! Every configured domain is queried; the answer set returned by a strict
//! majority of the domains wins. A lone domain is its own majority.

use pulse_core::TxtRecordResolver;
use pulse_core::checkpoint::{CheckpointError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const TXT_RECORD_TYPE: u16 = 16;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

pub struct DohTxtResolver {
    endpoint: String,
    timeout: Duration,
}

impl DohTxtResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn query(&self, domain: &str) -> Result<Vec<String>> {
        let resolver_err = |e: reqwest::Error| CheckpointError::Resolver(format!("{}: {}", domain, e));

        // blocking client: callers run this off the async executor
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(resolver_err)?;
        let body = client
            .get(&self.endpoint)
            .query(&[("name", domain), ("type", "TXT")])
            .header("accept", "application/dns-json")
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(resolver_err)?;

        parse_doh_answer(&body)
    }
}

impl TxtRecordResolver for DohTxtResolver {
    fn load_txt_records(&self, domains: &[String]) -> Result<Vec<String>> {
        if domains.is_empty() {
            return Ok(Vec::new());
        }

        let mut answers = Vec::with_capacity(domains.len());
        for domain in domains {
            match self.query(domain) {
                Ok(mut records) => {
                    records.sort();
                    answers.push(records);
                }
                Err(e) => log::warn!("TXT lookup for {} failed: {}", domain, e),
            }
        }

        select_agreed_records(answers, domains.len()).ok_or_else(|| {
            CheckpointError::Resolver(format!(
                "no majority agreement among {} checkpoint domains",
                domains.len()
            ))
        })
    }
}

/// Extract TXT strings from a DoH JSON response body.
pub fn parse_doh_answer(body: &str) -> Result<Vec<String>> {
    let response: DohResponse = serde_json::from_str(body)
        .map_err(|e| CheckpointError::Resolver(format!("bad DoH response: {}", e)))?;
    if response.status != 0 {
        return Err(CheckpointError::Resolver(format!(
            "DNS query failed with status {}",
            response.status
        )));
    }

    Ok(response
        .answer
        .iter()
        .filter(|a| a.record_type == TXT_RECORD_TYPE)
        .map(|a| unquote_txt(&a.data))
        .collect())
}

/// `"abc" "def"` -> `abcdef`; unquoted data is returned trimmed.
pub fn unquote_txt(data: &str) -> String {
    let data = data.trim();
    if !data.starts_with('"') {
        return data.to_string();
    }
    data.split('"')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, part)| part)
        .collect()
}

/// Pick the answer set reported by a strict majority of `domain_count` domains.
pub fn select_agreed_records(answers: Vec<Vec<String>>, domain_count: usize) -> Option<Vec<String>> {
    let mut votes: HashMap<Vec<String>, usize> = HashMap::new();
    for answer in answers {
        *votes.entry(answer).or_insert(0) += 1;
    }

    votes
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .filter(|(_, count)| count * 2 > domain_count)
        .map(|(records, _)| records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(records: &[&str]) -> Vec<String> {
        records.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn parse_txt_answers() {
        let body = r#"{
            "Status": 0,
            "Answer": [
                {"name": "checkpoints.example.org.", "type": 16, "TTL": 300, "data": "\"1500:abcd\""},
                {"name": "checkpoints.example.org.", "type": 5, "TTL": 300, "data": "alias.example.org."},
                {"name": "checkpoints.example.org.", "type": 16, "TTL": 300, "data": "\"2000:\" \"ef01\""}
            ]
        }"#;

        let records = parse_doh_answer(body).unwrap();
        assert_eq!(records, set(&["1500:abcd", "2000:ef01"]));
    }

    #[test]
    fn no_answer_section_means_no_records() {
        assert!(parse_doh_answer(r#"{"Status": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn failed_query_status_is_an_error() {
        let err = parse_doh_answer(r#"{"Status": 3, "Answer": []}"#).unwrap_err();
        assert!(matches!(err, CheckpointError::Resolver(_)));
        assert!(parse_doh_answer("<html>").is_err());
    }

    #[test]
    fn unquote_variants() {
        assert_eq!(unquote_txt("\"10:aa\""), "10:aa");
        assert_eq!(unquote_txt(" 10:aa "), "10:aa");
        assert_eq!(unquote_txt("\"10:\" \"aa\""), "10:aa");
    }

    #[test]
    fn majority_wins() {
        let a = set(&["1:aa"]);
        let b = set(&["1:bb"]);

        assert_eq!(
            select_agreed_records(vec![a.clone(), a.clone(), b.clone()], 3),
            Some(a.clone())
        );
        // two of four is not a strict majority
        assert_eq!(
            select_agreed_records(vec![a.clone(), a.clone(), b.clone(), b.clone()], 4),
            None
        );
        // failed domains count against the majority
        assert_eq!(select_agreed_records(vec![a.clone()], 3), None);
        assert_eq!(select_agreed_records(vec![b.clone()], 1), Some(b));
        assert_eq!(select_agreed_records(Vec::new(), 2), None);
    }

    #[test]
    fn empty_domain_list_skips_network() {
        let resolver = DohTxtResolver::new("http://127.0.0.1:9/dns-query");
        assert!(resolver.load_txt_records(&[]).unwrap().is_empty());
    }
}
