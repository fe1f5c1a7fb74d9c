//! Many-objective ranking: dominance, preference sorting, crowding.
//!
//! All comparisons read the per-objective distances cached on the encodings
//! by the evaluator. A missing cache entry scores as infinitely far, which
//! only happens for individuals that were never evaluated.

use crate::algorithms::SearchError;
use evogen_encoding::{Encoding, ObjectiveId};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;

/// Outcome of a pairwise dominance comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    First,
    Second,
    Neither,
}

fn distance_of<E: Encoding>(e: &E, objective: &ObjectiveId) -> f64 {
    e.cached_distance(objective).unwrap_or(f64::MAX)
}

/// Pareto dominance over the given objectives.
///
/// Objectives both individuals already cover (both distances zero) carry no
/// information and are skipped, so saturation on covered goals cannot mask
/// progress on the remaining ones.
pub fn dominance_compare<E: Encoding>(a: &E, b: &E, objectives: &[ObjectiveId]) -> Dominance {
    let mut a_better = false;
    let mut b_better = false;

    for objective in objectives {
        let da = distance_of(a, objective);
        let db = distance_of(b, objective);
        if da == 0.0 && db == 0.0 {
            continue;
        }
        if da < db {
            a_better = true;
        } else if db < da {
            b_better = true;
        }
        if a_better && b_better {
            return Dominance::Neither;
        }
    }

    match (a_better, b_better) {
        (true, false) => Dominance::First,
        (false, true) => Dominance::Second,
        _ => Dominance::Neither,
    }
}

/// Fast non-dominated sorting. Returns fronts of indices into `pool`,
/// best front first. Every index appears in exactly one front.
pub fn fast_non_dominated_sort<E: Encoding>(
    pool: &[E],
    objectives: &[ObjectiveId],
) -> Vec<Vec<usize>> {
    let all: Vec<usize> = (0..pool.len()).collect();
    fast_non_dominated_sort_subset(pool, &all, objectives)
}

/// Non-dominated sorting restricted to `subset`. Returned fronts hold
/// indices into `pool`, not into `subset`.
pub fn fast_non_dominated_sort_subset<E: Encoding>(
    pool: &[E],
    subset: &[usize],
    objectives: &[ObjectiveId],
) -> Vec<Vec<usize>> {
    let n = subset.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            match dominance_compare(&pool[subset[i]], &pool[subset[j]], objectives) {
                Dominance::First => {
                    dominated_by[i].push(j);
                    domination_count[j] += 1;
                }
                Dominance::Second => {
                    dominated_by[j].push(i);
                    domination_count[i] += 1;
                }
                Dominance::Neither => {}
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        let resolved = current.iter().map(|&i| subset[i]).collect();
        fronts.push(resolved);
        current = next;
    }

    fronts
}

/// Preference sorting: the champion (lowest distance) of each uncovered
/// objective, deduplicated.
///
/// Ties on distance prefer the smaller encoding, unless that would crown a
/// trivial one-statement individual; then (and on a full tie) a seeded coin
/// flip decides, so no pool position is systematically favored.
pub fn preference_sort<E: Encoding>(
    pool: &[E],
    objectives: &[ObjectiveId],
    rng: &mut ChaCha8Rng,
) -> Vec<usize> {
    let mut champions = Vec::new();

    for objective in objectives {
        let mut best: Option<usize> = None;
        for (i, candidate) in pool.iter().enumerate() {
            let Some(b) = best else {
                best = Some(i);
                continue;
            };
            let di = distance_of(candidate, objective);
            let db = distance_of(&pool[b], objective);
            let wins = match di.partial_cmp(&db).unwrap_or(Ordering::Equal) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => match candidate.size().cmp(&pool[b].size()) {
                    Ordering::Less if candidate.size() > 1 => true,
                    Ordering::Greater if pool[b].size() > 1 => false,
                    _ => rng.gen_bool(0.5),
                },
            };
            if wins {
                best = Some(i);
            }
        }
        if let Some(b) = best {
            if !champions.contains(&b) {
                champions.push(b);
            }
        }
    }

    champions.sort_unstable();
    champions
}

/// Crowding distance of each member of `front`, aligned with `front`.
///
/// Fronts of one or two members are all boundaries and get infinity, as do
/// the extreme members of larger fronts.
pub fn crowding_distance<E: Encoding>(
    pool: &[E],
    front: &[usize],
    objectives: &[ObjectiveId],
) -> Vec<f64> {
    let len = front.len();
    if len <= 2 {
        return vec![f64::INFINITY; len];
    }

    let mut crowding = vec![0.0f64; len];
    for objective in objectives {
        let mut order: Vec<usize> = (0..len).collect();
        order.sort_by(|&i, &j| {
            distance_of(&pool[front[i]], objective)
                .partial_cmp(&distance_of(&pool[front[j]], objective))
                .unwrap_or(Ordering::Equal)
        });

        let lo = distance_of(&pool[front[order[0]]], objective);
        let hi = distance_of(&pool[front[order[len - 1]]], objective);

        crowding[order[0]] = f64::INFINITY;
        crowding[order[len - 1]] = f64::INFINITY;

        if hi <= lo {
            continue;
        }
        for w in 1..len - 1 {
            let prev = distance_of(&pool[front[order[w - 1]]], objective);
            let next = distance_of(&pool[front[order[w + 1]]], objective);
            crowding[order[w]] += (next - prev) / (hi - lo);
        }
    }
    crowding
}

/// Fill the next population front by front; the last partial front is cut
/// by descending crowding distance.
///
/// Returning anything but exactly `n` survivors is a bug in the caller's
/// front composition, reported as a fatal error rather than silently
/// shrinking the population.
pub fn environmental_selection<E: Encoding>(
    pool: &[E],
    fronts: &[Vec<usize>],
    n: usize,
    objectives: &[ObjectiveId],
) -> Result<Vec<E>, SearchError> {
    let mut selected: Vec<E> = Vec::with_capacity(n);

    for front in fronts {
        if selected.len() == n {
            break;
        }
        if selected.len() + front.len() <= n {
            selected.extend(front.iter().map(|&i| pool[i].clone()));
        } else {
            let crowding = crowding_distance(pool, front, objectives);
            let mut order: Vec<usize> = (0..front.len()).collect();
            order.sort_by(|&i, &j| {
                crowding[j].partial_cmp(&crowding[i]).unwrap_or(Ordering::Equal)
            });
            let need = n - selected.len();
            selected.extend(order[..need].iter().map(|&w| pool[front[w]].clone()));
        }
    }

    if selected.len() != n {
        return Err(SearchError::SelectionSize {
            got: selected.len(),
            expected: n,
        });
    }
    Ok(selected)
}
