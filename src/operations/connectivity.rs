use std::collections::BTreeSet;

/// Merges sets that share an element, transitively.
///
/// Each group starts from the first unclaimed set and keeps absorbing every
/// unclaimed set that overlaps it until a full pass adds nothing. Groups are
/// returned in seed order and are pairwise disjoint.
#[must_use]
pub fn group_overlapping(sets: &[BTreeSet<u32>]) -> Vec<BTreeSet<u32>> {
    let mut claimed = vec![false; sets.len()];
    let mut groups = Vec::new();
    for seed in 0..sets.len() {
        if claimed[seed] {
            continue;
        }
        claimed[seed] = true;
        let mut group = sets[seed].clone();
        loop {
            let mut grown = false;
            for (i, set) in sets.iter().enumerate() {
                if !claimed[i] && !group.is_disjoint(set) {
                    claimed[i] = true;
                    group.extend(set);
                    grown = true;
                }
            }
            if !grown {
                break;
            }
        }
        groups.push(group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_meshes::set;

    #[test]
    fn chains_merge_transitively() {
        let groups = group_overlapping(&[set(&[0, 1]), set(&[5, 6]), set(&[2, 3]), set(&[1, 2])]);
        assert_eq!(groups, vec![set(&[0, 1, 2, 3]), set(&[5, 6])]);
    }

    #[test]
    fn late_bridge_joins_earlier_groups() {
        // The bridge {3, 7} is only reachable after {1, 3} joins the group.
        let groups = group_overlapping(&[set(&[0, 1]), set(&[7, 8]), set(&[1, 3]), set(&[3, 7])]);
        assert_eq!(groups, vec![set(&[0, 1, 3, 7, 8])]);
    }

    #[test]
    fn empty_input() {
        assert!(group_overlapping(&[]).is_empty());
    }
}
