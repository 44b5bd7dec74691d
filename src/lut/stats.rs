//! Per-code decision counts.

use std::collections::BTreeMap;

use crate::net::ActionOrder;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: BTreeMap<u8, usize>,
    total: usize,
}

impl Histogram {
    pub fn of(codes: &[u8]) -> Histogram {
        let mut h = Histogram::default();
        for &c in codes {
            *h.counts.entry(c).or_insert(0) += 1;
        }
        h.total = codes.len();
        h
    }

    pub fn count(&self, code: u8) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Codes that occur at least once, ascending, with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.counts.iter().map(|(&c, &n)| (c, n))
    }

    pub fn percent(&self, code: u8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(code) as f64 * 100.0 / self.total as f64
    }

    /// One line per action in code order, then any codes outside the action set.
    pub fn format_report(&self, actions: &ActionOrder) -> String {
        let mut out = String::new();
        for (code, action) in actions.0.iter().enumerate() {
            let code = code as u8;
            out.push_str(&format!(
                "  {} {:<5} {:>9} ({:>5.1}%)\n",
                code,
                action.name(),
                self.count(code),
                self.percent(code)
            ));
        }
        for (code, n) in self.iter().filter(|&(c, _)| actions.action(c).is_none()) {
            out.push_str(&format!(
                "  {} ?     {:>9} ({:>5.1}%)\n",
                code,
                n,
                self.percent(code)
            ));
        }
        out
    }
}
