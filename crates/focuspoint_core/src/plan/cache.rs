//! crates/focuspoint_core/src/plan/cache.rs
//!
//! Per-date cache of AI day plans, keyed by calendar date and guarded by the
//! input fingerprint so the model is only called when the inputs changed.

use super::fingerprint::fingerprint;
use super::parser::parse_plan_response;
use super::prompt::build_plan_prompt;
use crate::domain::{AiPlan, PlanItem, PlanItemPatch, ScheduleEvent, UserSettings};
use crate::error::AiError;
use crate::ports::TextGenerationService;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How [`PlanCache::ensure_plan`] satisfied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Cached,
    Generated,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanCache {
    plans: BTreeMap<NaiveDate, AiPlan>,
}

impl PlanCache {
    pub fn get(&self, date: NaiveDate) -> Option<&AiPlan> {
        self.plans.get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &AiPlan)> {
        self.plans.iter()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn clear(&mut self) {
        self.plans.clear();
    }

    /// Returns the plan for `date`, regenerating it only when `force_refresh`
    /// is set, no plan exists, or its fingerprint no longer matches.
    ///
    /// On any error the previous entry for `date` is left as it was.
    pub async fn ensure_plan(
        &mut self,
        date: NaiveDate,
        schedule: &[ScheduleEvent],
        settings: &UserSettings,
        force_refresh: bool,
        generator: &dyn TextGenerationService,
        now: DateTime<Utc>,
    ) -> Result<PlanSource, AiError> {
        let current = fingerprint(date, schedule, settings);
        if !force_refresh {
            if let Some(plan) = self.plans.get(&date) {
                if plan.fingerprint == current {
                    debug!(%date, "AI plan cache hit");
                    return Ok(PlanSource::Cached);
                }
            }
        }

        info!(%date, force_refresh, "Generating AI day plan");
        let prompt = build_plan_prompt(date, schedule, settings);
        let raw = generator.generate_text(&prompt, &[]).await.map_err(|e| {
            warn!(%date, error = %e, "AI plan generation failed");
            AiError::from(e)
        })?;
        let parsed = parse_plan_response(&raw).inspect_err(|e| {
            warn!(%date, error = %e, "AI plan response rejected");
        })?;

        let items = parsed
            .items
            .into_iter()
            .map(|draft| PlanItem {
                id: Uuid::new_v4(),
                start: draft.start,
                end: draft.end,
                title: draft.title,
                kind: draft.kind,
                is_recommendation: draft.is_recommendation,
                is_completed: false,
            })
            .collect();
        self.plans.insert(
            date,
            AiPlan {
                items,
                analysis: parsed.analysis,
                last_generated: now,
                fingerprint: current,
            },
        );
        Ok(PlanSource::Generated)
    }

    /// Flips completion of one item. Returns whether the item was found.
    pub fn toggle_item(&mut self, date: NaiveDate, item_id: Uuid) -> bool {
        match self.item_mut(date, item_id) {
            Some(item) => {
                item.is_completed = !item.is_completed;
                true
            }
            None => false,
        }
    }

    pub fn edit_item(&mut self, date: NaiveDate, item_id: Uuid, patch: PlanItemPatch) -> bool {
        let Some(item) = self.item_mut(date, item_id) else {
            return false;
        };
        if let Some(start) = patch.start {
            item.start = start;
        }
        if let Some(end) = patch.end {
            item.end = end;
        }
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(kind) = patch.kind {
            item.kind = kind;
        }
        true
    }

    pub fn remove_item(&mut self, date: NaiveDate, item_id: Uuid) -> bool {
        let Some(plan) = self.plans.get_mut(&date) else {
            return false;
        };
        let before = plan.items.len();
        plan.items.retain(|item| item.id != item_id);
        plan.items.len() != before
    }

    fn item_mut(&mut self, date: NaiveDate, item_id: Uuid) -> Option<&mut PlanItem> {
        self.plans
            .get_mut(&date)?
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatTurn, PlanItemKind};
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted(Mutex<Vec<PortResult<String>>>);

    #[async_trait]
    impl TextGenerationService for Scripted {
        async fn generate_text(&self, _prompt: &str, _history: &[ChatTurn]) -> PortResult<String> {
            self.0
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(PortError::Unexpected("script exhausted".into())))
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    const REPLY: &str = r#"{"plan":[{"start":"16:00","end":"17:00","title":"Homework","type":"productivity","isRecommendation":true}],"analysis":"ok"}"#;

    #[tokio::test]
    async fn failure_keeps_previous_entry() {
        // Popped from the back: first call succeeds, second is malformed.
        let ai = Scripted(Mutex::new(vec![Ok("not json".into()), Ok(REPLY.into())]));
        let settings = UserSettings::default();
        let mut cache = PlanCache::default();

        cache.ensure_plan(date(), &[], &settings, false, &ai, Utc::now()).await.unwrap();
        let before = cache.get(date()).cloned().unwrap();

        let err = cache.ensure_plan(date(), &[], &settings, true, &ai, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AiError::MalformedResponse(_)));
        assert_eq!(cache.get(date()), Some(&before));
    }

    #[tokio::test]
    async fn item_edits_keep_the_fingerprint() {
        let ai = Scripted(Mutex::new(vec![Ok(REPLY.into())]));
        let settings = UserSettings::default();
        let mut cache = PlanCache::default();
        cache.ensure_plan(date(), &[], &settings, false, &ai, Utc::now()).await.unwrap();
        let plan = cache.get(date()).unwrap().clone();
        let id = plan.items[0].id;
        assert!(!plan.items[0].is_completed);

        assert!(cache.toggle_item(date(), id));
        assert!(cache.edit_item(
            date(),
            id,
            PlanItemPatch { title: Some("Essay".into()), kind: Some(PlanItemKind::Activity), ..Default::default() }
        ));
        let edited = &cache.get(date()).unwrap().items[0];
        assert!(edited.is_completed);
        assert_eq!(edited.title, "Essay");
        assert_eq!(cache.get(date()).unwrap().fingerprint, plan.fingerprint);

        assert!(cache.remove_item(date(), id));
        assert!(!cache.remove_item(date(), id));
        assert!(!cache.toggle_item(date(), Uuid::new_v4()));
    }

    #[test]
    fn serializes_as_a_date_keyed_map() {
        let mut cache = PlanCache::default();
        cache.plans.insert(
            date(),
            AiPlan {
                items: Vec::new(),
                analysis: String::new(),
                last_generated: Utc::now(),
                fingerprint: "f".into(),
            },
        );
        let json = serde_json::to_value(&cache).unwrap();
        assert!(json.get("2024-06-10").is_some());
        let back: PlanCache = serde_json::from_value(json).unwrap();
        assert_eq!(back, cache);
    }
}
