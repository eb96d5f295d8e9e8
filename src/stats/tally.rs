use std::collections::HashMap;
use std::hash::Hash;

/// Map that remembers the order in which keys were first seen.
///
/// Leader selection walks entries in that order and only replaces the
/// current best on a strictly greater score, so ties go to the earliest key.
#[derive(Debug, Clone)]
pub(crate) struct FirstSeen<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> Default for FirstSeen<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K, V> FirstSeen<K, V>
where
    K: Eq + Hash + Clone,
    V: Default,
{
    pub(crate) fn entry(&mut self, key: K) -> &mut V {
        let position = match self.index.get(&key) {
            Some(position) => *position,
            None => {
                let position = self.entries.len();
                self.index.insert(key.clone(), position);
                self.entries.push((key, V::default()));
                position
            }
        };
        &mut self.entries[position].1
    }

    pub(crate) fn leader_by<F>(&self, score: F) -> Option<&(K, V)>
    where
        F: Fn(&V) -> usize,
    {
        let mut leader: Option<(&(K, V), usize)> = None;
        for entry in &self.entries {
            let entry_score = score(&entry.1);
            if leader.is_none_or(|(_, best)| entry_score > best) {
                leader = Some((entry, entry_score));
            }
        }
        leader.map(|(entry, _)| entry)
    }

    pub(crate) fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_first_seen_order() {
        let mut counts: FirstSeen<&str, usize> = FirstSeen::default();
        for key in ["b", "a", "b", "c", "a"] {
            *counts.entry(key) += 1;
        }

        assert_eq!(counts.into_entries(), vec![("b", 2), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn leader_ties_go_to_earliest_key() {
        let mut counts: FirstSeen<&str, usize> = FirstSeen::default();
        for key in ["x", "y", "y", "x", "z"] {
            *counts.entry(key) += 1;
        }

        let leader = counts.leader_by(|count| *count).map(|(key, _)| *key);

        assert_eq!(leader, Some("x"));
    }

    #[test]
    fn empty_has_no_leader() {
        let counts: FirstSeen<u8, usize> = FirstSeen::default();

        assert!(counts.leader_by(|count| *count).is_none());
    }
}
