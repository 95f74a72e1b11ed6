// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reflection: synthesizing higher-level insights from recent memories.
//!
//! A pass asks the fast tier for the most salient questions raised by the
//! latest records, gathers evidence for each question by similarity, asks for
//! insights citing that evidence, and writes the insights back into the
//! stream as `ReflectionInsight` records.

use std::fmt;
use std::sync::LazyLock;

use fable_config::model::MemoryConfig;
use fable_core::template::fill;
use fable_core::{FableError, ModelTier};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::stream::MemoryStream;
use crate::types::{RecordId, RecordKind};

const TOPICS_PROMPT: &str = "{observations}

Given only the information above, what are the {num_topics} most salient high-level questions we can answer about the subjects in the statements?
Provide each question on a new line.";

const INSIGHTS_PROMPT: &str = "Statements relevant to: '{topic}'
---
{related_statements}
---
What {num_insights} high-level novel insights can you infer from the above statements that are relevant for answering the following question?
Do not include any insights that are not relevant to the question.
Do not repeat any insights that have already been made.
Format your insights as follows: `Insight <insight_num>: <insight> (because of statements [<statement_num>], [<statement_num>], ...)`
Start with insight_num = {insight_num}.

Question: {topic}";

static LIST_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s*").expect("static regex is valid"));

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("static regex is valid"));

/// Whether a reflection pass is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionState {
    Idle,
    Reflecting,
}

impl fmt::Display for ReflectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionState::Idle => write!(f, "idle"),
            ReflectionState::Reflecting => write!(f, "reflecting"),
        }
    }
}

/// One insight produced during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub record_id: RecordId,
    pub text: String,
    pub supporting_ids: Vec<RecordId>,
}

/// Everything one pass produced, keyed by the question it answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionPass {
    pub topics: Vec<(String, Vec<Insight>)>,
}

impl ReflectionPass {
    pub fn insight_count(&self) -> usize {
        self.topics.iter().map(|(_, insights)| insights.len()).sum()
    }
}

/// Synthesizes insights from a [`MemoryStream`]. All state is per instance.
#[derive(Debug)]
pub struct ReflectionEngine {
    state: ReflectionState,
    next_insight_num: usize,
    log: Vec<ReflectionPass>,
    last_k: usize,
    related_k: usize,
    num_topics: usize,
    insights_per_topic: usize,
}

impl ReflectionEngine {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            state: ReflectionState::Idle,
            next_insight_num: 1,
            log: Vec::new(),
            last_k: config.reflection_last_k,
            related_k: config.generative_k,
            num_topics: config.num_topics,
            insights_per_topic: config.num_insights_per_topic,
        }
    }

    pub fn state(&self) -> ReflectionState {
        self.state
    }

    /// Completed passes, oldest first.
    pub fn log(&self) -> &[ReflectionPass] {
        &self.log
    }

    /// Run one full pass. The engine returns to `Idle` whether or not the pass succeeds.
    pub async fn reflect(&mut self, stream: &mut MemoryStream) -> Result<&ReflectionPass, FableError> {
        if self.state == ReflectionState::Reflecting {
            return Err(FableError::Internal(
                "reflection requested while a pass is already running".to_string(),
            ));
        }

        self.state = ReflectionState::Reflecting;
        info!(records = stream.len(), "reflecting");
        let outcome = self.run_pass(stream).await;
        self.state = ReflectionState::Idle;

        let pass = outcome?;
        info!(
            topics = pass.topics.len(),
            insights = pass.insight_count(),
            "done reflecting"
        );
        self.log.push(pass);
        self.log
            .last()
            .ok_or_else(|| FableError::Internal("reflection log is empty".to_string()))
    }

    async fn run_pass(&mut self, stream: &mut MemoryStream) -> Result<ReflectionPass, FableError> {
        let topics = self.topics(stream).await?;
        for topic in &topics {
            info!(topic = %topic, "topic of reflection");
        }

        let mut pass = ReflectionPass::default();
        for topic in topics {
            let texts = self.insights_on(stream, &topic).await?;
            let mut insights = Vec::with_capacity(texts.len());
            for text in texts {
                let supporting_ids = parse_citations(&text);
                let (record_id, _) = stream
                    .add(
                        &text,
                        RecordKind::ReflectionInsight {
                            topic: topic.clone(),
                            supporting_ids: supporting_ids.clone(),
                        },
                    )
                    .await?;
                info!(topic = %topic, record_id, insight = %text, "added insight");
                insights.push(Insight {
                    record_id,
                    text,
                    supporting_ids,
                });
            }
            pass.topics.push((topic, insights));
        }
        Ok(pass)
    }

    async fn topics(&self, stream: &MemoryStream) -> Result<Vec<String>, FableError> {
        let observations = MemoryStream::render_all(stream.recent(self.last_k));
        let num_topics = self.num_topics.to_string();
        let prompt = fill(
            TOPICS_PROMPT,
            &[
                ("observations", observations.as_str()),
                ("num_topics", num_topics.as_str()),
            ],
        );
        let reply = stream
            .completion()
            .complete_text(&prompt, ModelTier::Fast)
            .await?;

        let mut topics = parse_list(&reply);
        if topics.len() > self.num_topics {
            debug!(
                returned = topics.len(),
                wanted = self.num_topics,
                "truncating reflection topics"
            );
            topics.truncate(self.num_topics);
        }
        if topics.is_empty() {
            warn!("reflection produced no topics");
        }
        Ok(topics)
    }

    async fn insights_on(
        &mut self,
        stream: &MemoryStream,
        topic: &str,
    ) -> Result<Vec<String>, FableError> {
        let related = stream.similar(topic, self.related_k).await?;
        let related_statements =
            MemoryStream::render_all(related.iter().map(|hit| &hit.record));
        let num_insights = self.insights_per_topic.to_string();
        let insight_num = self.next_insight_num.to_string();
        let prompt = fill(
            INSIGHTS_PROMPT,
            &[
                ("related_statements", related_statements.as_str()),
                ("num_insights", num_insights.as_str()),
                ("insight_num", insight_num.as_str()),
                ("topic", topic),
            ],
        );
        let reply = stream
            .completion()
            .complete_text(&prompt, ModelTier::Fast)
            .await?;

        self.next_insight_num += self.insights_per_topic;
        let mut insights = parse_list(&reply);
        insights.truncate(self.insights_per_topic);
        Ok(insights)
    }
}

/// Split a model reply into non-empty lines with list markers removed.
pub fn parse_list(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .map(|line| LIST_NUMBERING.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Record ids cited as `[n]`, in order of first appearance.
pub fn parse_citations(insight: &str) -> Vec<RecordId> {
    let mut ids = Vec::new();
    for cap in CITATION.captures_iter(insight) {
        if let Ok(id) = cap[1].parse::<RecordId>()
            && !ids.contains(&id)
        {
            ids.push(id);
        }
    }
    ids
}
