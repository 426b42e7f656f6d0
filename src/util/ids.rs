//! Episode-ID synthesis (spec §4.1). The formula is externally exposed
//! and MUST stay byte-for-byte stable: installed players pass this id
//! back on every request.

const EPISODE_ID_BASE: i64 = 25 * 10i64.pow(12);
const ANIME_ID_SHIFT: i64 = 10i64.pow(6);
const SOURCE_ORDER_SHIFT: i64 = 10i64.pow(4);

pub const MAX_ANIME_ID: i32 = 999_999;
pub const MAX_SOURCE_ORDER: i32 = 99;
pub const MAX_EPISODE_INDEX: i32 = 9_999;

/// `episode_id = 25e12 + anime_id * 1e6 + source_order * 1e4 + episode_index`.
#[must_use]
pub fn episode_id(anime_id: i32, source_order: i32, episode_index: i32) -> i64 {
    EPISODE_ID_BASE
        + i64::from(anime_id) * ANIME_ID_SHIFT
        + i64::from(source_order) * SOURCE_ORDER_SHIFT
        + i64::from(episode_index)
}

/// Inverse of [`episode_id`], used by diagnostics and tests.
#[must_use]
pub fn decompose(id: i64) -> (i32, i32, i32) {
    let rest = id - EPISODE_ID_BASE;
    let anime_id = (rest / ANIME_ID_SHIFT) as i32;
    let rest = rest % ANIME_ID_SHIFT;
    let source_order = (rest / SOURCE_ORDER_SHIFT) as i32;
    let episode_index = (rest % SOURCE_ORDER_SHIFT) as i32;
    (anime_id, source_order, episode_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_spec_worked_example() {
        assert_eq!(episode_id(1, 1, 3), 25_000_001_010_003);
    }

    #[test]
    fn decompose_is_the_exact_inverse() {
        for (a, s, e) in [(1, 1, 3), (999_999, 99, 9999), (42, 7, 1)] {
            assert_eq!(decompose(episode_id(a, s, e)), (a, s, e));
        }
    }

    #[test]
    fn deterministic_for_all_valid_triples() {
        for a in [1, 1000, 999_999] {
            for s in [1, 50, 99] {
                for e in [1, 500, 9999] {
                    assert_eq!(
                        episode_id(a, s, e),
                        25_000_000_000_000i64 + i64::from(a) * 1_000_000 + i64::from(s) * 10_000 + i64::from(e)
                    );
                }
            }
        }
    }
}
