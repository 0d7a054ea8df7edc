//! Provider selection policies.

use std::sync::Mutex;

use rand::Rng;
use serde::Deserialize;

use super::provider::ProviderDescriptor;

/// How the first provider of a dispatch is picked.
///
/// Failover always rotates round-robin regardless of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    #[default]
    RoundRobin,
    Random,
}

/// Round-robin rotation over the active provider list.
///
/// The cursor is a plain index applied to whatever list the caller passes,
/// wrapped modulo its current length. It is not remapped when the list
/// changes size, so entries may be skipped or repeated across such a change.
#[derive(Debug, Default)]
pub struct ProviderSelector {
    cursor: Mutex<usize>,
}

impl ProviderSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the provider at the cursor and advance it.
    pub fn next<'a>(&self, active: &[&'a ProviderDescriptor]) -> Option<&'a ProviderDescriptor> {
        if active.is_empty() {
            return None;
        }
        // Read and advance under one lock.
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let index = *cursor % active.len();
        *cursor = (index + 1) % active.len();
        Some(active[index])
    }

    /// Return the first provider at or after the cursor that satisfies
    /// `accept`, moving the cursor just past it.
    ///
    /// The whole lap runs under one lock, so concurrent callers cannot take
    /// the accepted slot in between. Returns `None` after one full lap with
    /// no match, leaving the cursor where it started.
    pub fn next_matching<'a>(
        &self,
        active: &[&'a ProviderDescriptor],
        mut accept: impl FnMut(&ProviderDescriptor) -> bool,
    ) -> Option<&'a ProviderDescriptor> {
        if active.is_empty() {
            return None;
        }
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let start = *cursor % active.len();
        for offset in 0..active.len() {
            let index = (start + offset) % active.len();
            if accept(active[index]) {
                *cursor = (index + 1) % active.len();
                return Some(active[index]);
            }
        }
        *cursor = start;
        None
    }

    /// Return a uniformly random provider. Does not touch the cursor.
    pub fn random<'a>(&self, active: &[&'a ProviderDescriptor]) -> Option<&'a ProviderDescriptor> {
        if active.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..active.len());
        Some(active[index])
    }

    /// Pick according to `policy`.
    pub fn pick<'a>(
        &self,
        policy: SelectionPolicy,
        active: &[&'a ProviderDescriptor],
    ) -> Option<&'a ProviderDescriptor> {
        match policy {
            SelectionPolicy::RoundRobin => self.next(active),
            SelectionPolicy::Random => self.random(active),
        }
    }

    /// Current cursor value.
    pub fn cursor(&self) -> usize {
        *self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::llm::provider::ProviderKind;

    fn providers() -> Vec<ProviderDescriptor> {
        ProviderKind::ALL
            .into_iter()
            .map(|kind| ProviderDescriptor::builtin(kind, "key"))
            .collect()
    }

    fn ids<'a>(picked: impl IntoIterator<Item = &'a ProviderDescriptor>) -> Vec<&'a str> {
        picked.into_iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn empty_list_returns_none() {
        let selector = ProviderSelector::new();
        assert!(selector.next(&[]).is_none());
        assert!(selector.random(&[]).is_none());
        assert_eq!(selector.cursor(), 0);
    }

    #[test]
    fn rotates_in_configuration_order() {
        let all = providers();
        let active: Vec<&ProviderDescriptor> = all.iter().collect();
        let selector = ProviderSelector::new();

        let picked: Vec<_> = (0..6).filter_map(|_| selector.next(&active)).collect();
        assert_eq!(
            ids(picked),
            vec!["gemini", "openai", "anthropic", "mistral", "gemini", "openai"]
        );
        assert_eq!(selector.cursor(), 2);
    }

    #[test]
    fn lap_starts_from_current_cursor() {
        let all = providers();
        let active: Vec<&ProviderDescriptor> = all.iter().collect();
        let selector = ProviderSelector::new();
        selector.next(&active);

        let lap: Vec<_> = (0..4).filter_map(|_| selector.next(&active)).collect();
        assert_eq!(ids(lap), vec!["openai", "anthropic", "mistral", "gemini"]);
    }

    #[test]
    fn shrinking_list_wraps_stored_cursor() {
        let all = providers();
        let four: Vec<&ProviderDescriptor> = all.iter().collect();
        let two: Vec<&ProviderDescriptor> = all.iter().take(2).collect();
        let selector = ProviderSelector::new();

        // Cursor lands on 3 against the four-provider list.
        for _ in 0..3 {
            selector.next(&four);
        }
        assert_eq!(selector.cursor(), 3);

        // 3 mod 2 == 1, so the second entry is returned with no remapping.
        assert_eq!(selector.next(&two).unwrap().id, "openai");
        assert_eq!(selector.cursor(), 0);
        assert_eq!(selector.next(&two).unwrap().id, "gemini");
    }

    #[test]
    fn next_matching_skips_rejected_entries() {
        let all = providers();
        let active: Vec<&ProviderDescriptor> = all.iter().collect();
        let selector = ProviderSelector::new();

        let picked = selector
            .next_matching(&active, |p| p.id != "gemini" && p.id != "openai")
            .unwrap();
        assert_eq!(picked.id, "anthropic");
        assert_eq!(selector.cursor(), 3);

        // Wraps past the end of the list.
        let picked = selector.next_matching(&active, |p| p.id == "openai").unwrap();
        assert_eq!(picked.id, "openai");
        assert_eq!(selector.cursor(), 2);
    }

    #[test]
    fn next_matching_without_match_keeps_cursor() {
        let all = providers();
        let active: Vec<&ProviderDescriptor> = all.iter().collect();
        let selector = ProviderSelector::new();
        selector.next(&active);

        assert!(selector.next_matching(&active, |_| false).is_none());
        assert_eq!(selector.cursor(), 1);
        assert!(selector.next_matching(&[], |_| true).is_none());
    }

    #[test]
    fn next_matching_finds_untried_slot_under_contention() {
        let all = Arc::new(providers().into_iter().take(2).collect::<Vec<_>>());
        let selector = Arc::new(ProviderSelector::new());

        let handles: Vec<_> = (0..400)
            .map(|i| {
                let all = Arc::clone(&all);
                let selector = Arc::clone(&selector);
                std::thread::spawn(move || {
                    let active: Vec<&ProviderDescriptor> = all.iter().collect();
                    if i % 2 == 0 {
                        selector.next(&active).map(|p| p.id.clone())
                    } else {
                        selector
                            .next_matching(&active, |p| p.id != "gemini")
                            .map(|p| p.id.clone())
                    }
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let picked = handle.join().unwrap();
            if i % 2 == 1 {
                assert_eq!(picked.as_deref(), Some("openai"));
            }
        }
    }

    #[test]
    fn random_stays_within_active_set() {
        let all = providers();
        let active: Vec<&ProviderDescriptor> = all.iter().skip(2).collect();
        let selector = ProviderSelector::new();

        for _ in 0..50 {
            let picked = selector.pick(SelectionPolicy::Random, &active).unwrap();
            assert!(picked.id == "anthropic" || picked.id == "mistral");
        }
        assert_eq!(selector.cursor(), 0);
    }

    #[test]
    fn concurrent_callers_get_one_slot_each_per_lap() {
        let all = Arc::new(providers());
        let selector = Arc::new(ProviderSelector::new());
        let laps = 25;

        let handles: Vec<_> = (0..all.len() * laps)
            .map(|_| {
                let all = Arc::clone(&all);
                let selector = Arc::clone(&selector);
                std::thread::spawn(move || {
                    let active: Vec<&ProviderDescriptor> = all.iter().collect();
                    selector.next(&active).unwrap().id.clone()
                })
            })
            .collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            *counts.entry(handle.join().unwrap()).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&n| n == laps));
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let policy: SelectionPolicy = serde_json::from_str("\"round_robin\"").unwrap();
        assert_eq!(policy, SelectionPolicy::RoundRobin);
        let policy: SelectionPolicy = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(policy, SelectionPolicy::Random);
    }
}
