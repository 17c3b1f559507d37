use crate::core::{Account, Amount};

/// Two largest balances in a single pass.
///
/// `entries` must come in participation order: on equal balances the
/// entry seen first ranks higher, since only a strictly larger balance
/// displaces a candidate.
pub fn top_two<'a, I>(entries: I) -> Option<(&'a Account, &'a Account)>
where
    I: IntoIterator<Item = (&'a Account, Amount)>
{
    let mut first: Option<(&Account, Amount)> = None;
    let mut second: Option<(&Account, Amount)> = None;

    for (account, balance) in entries {
        match first {
            Some((_, best)) if balance <= best => {
                match second {
                    Some((_, runner_up)) if balance <= runner_up => (),
                    _ => second = Some((account, balance))
                }
            },
            _ => {
                second = first;
                first = Some((account, balance));
            }
        }
    }

    return match (first, second) {
        (Some((first, _)), Some((second, _))) => Some((first, second)),
        _ => None
    };
}

/// Every entry by descending balance, ties kept in participation order.
pub fn leaderboard<'a, I>(entries: I) -> Vec<(&'a Account, Amount)>
where
    I: IntoIterator<Item = (&'a Account, Amount)>
{
    let mut ranked: Vec<_> = entries.into_iter().collect();
    // stable: equal balances keep their relative order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    return ranked;
}
