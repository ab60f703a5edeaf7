//! Per-domain ECS analysis.
//!
//! Drives the prober across the configured vantage list and folds the
//! probe results into a verdict: does the domain's resolution honor the
//! client subnet, and does the answer actually differ between subnets.

use crate::error::Result;
use crate::prober::{Exchange, ProbeResult, Prober};
use crate::subnet::Subnet;

/// Verdict for one domain after probing the subnet list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainVerdict {
    pub domain: String,
    pub ecs_supported: bool,
    /// Meaningful only when `ecs_supported` is true; stays vacuously
    /// true when no probe triggered a comparison.
    pub consistent_across_subnets: bool,
}

/// Drives the prober across an injected, ordered subnet list.
pub struct Analyzer {
    subnets: Vec<Subnet>,
}

impl Analyzer {
    /// `subnets` is the ordered vantage list; callers supply at least
    /// one entry.
    pub fn new(subnets: Vec<Subnet>) -> Self {
        Self { subnets }
    }

    /// Probe `domain` from every subnet in order and fold the results.
    ///
    /// The first ECS-supporting probe becomes the reference; a later
    /// supporting probe with a different address set marks the domain
    /// inconsistent and stops the scan early. A non-supporting probe
    /// replaces the reference outright, so the final support flag
    /// follows the last probed subnet.
    pub async fn analyze<E: Exchange>(
        &self,
        prober: &Prober<E>,
        domain: &str,
    ) -> Result<DomainVerdict> {
        let mut reference: Option<ProbeResult> = None;
        let mut consistent = true;

        for subnet in &self.subnets {
            let result = prober.probe(domain, subnet).await?;

            if result.ecs_supported {
                match &reference {
                    Some(r) if r.addresses != result.addresses => {
                        consistent = false;
                        break;
                    }
                    Some(_) => {}
                    None => reference = Some(result),
                }
            } else {
                reference = Some(result);
            }
        }

        Ok(DomainVerdict {
            domain: domain.to_string(),
            ecs_supported: reference.is_some_and(|r| r.ecs_supported),
            consistent_across_subnets: consistent,
        })
    }
}

/// Running totals across all domain verdicts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total_domains: usize,
    pub ecs_supported: usize,
    pub ecs_but_consistent: usize,
}

impl RunSummary {
    pub fn record(&mut self, verdict: &DomainVerdict) {
        self.total_domains += 1;
        if verdict.ecs_supported {
            self.ecs_supported += 1;
            if verdict.consistent_across_subnets {
                self.ecs_but_consistent += 1;
            }
        }
    }
}
