//! The copy-on-write overlay a single block's `apply` runs against (§4.3).
//!
//! A `StateTransition` borrows the pre-block `State` and keeps at most one
//! "prime" clone per component. Sub-steps that only read a component never
//! pay for a clone; a sub-step that mutates one clones it on first touch
//! and every subsequent read/write in the same transition sees that clone.
//! `merge_prime_onto_base` folds every touched prime back into a fresh
//! `State`, atomically from the caller's point of view — either the whole
//! block's primes land or (on early return via `?`) none do, because the
//! overlay is simply dropped.

use crate::state::disputes::Disputes;
use crate::state::history::RecentHistory;
use crate::state::report::{PendingReport, ReadyEntry};
use crate::state::service::{Authorizations, Privileges, ServiceMap};
use crate::state::stats::Statistics;
use crate::state::State;
use crate::types::{BandersnatchVrfRoot, Hash, SealerSeries, ServiceId, Ticket, TimeSlot, ValidatorKeys};
use std::collections::HashSet;

macro_rules! ensure_get {
    ($ensure:ident, $get:ident, $field:ident, $ty:ty) => {
        pub fn $ensure(&mut self) -> &mut $ty {
            if self.$field.is_none() {
                self.$field = Some(self.base.$field.clone());
            }
            self.$field.as_mut().expect("just populated")
        }

        pub fn $get(&self) -> &$ty {
            self.$field.as_ref().unwrap_or(&self.base.$field)
        }
    };
}

/// One block's in-flight state transition.
pub struct StateTransition<'a> {
    base: &'a State,
    tau: Option<TimeSlot>,
    eta: Option<[Hash; 4]>,
    iota: Option<Vec<ValidatorKeys>>,
    kappa: Option<Vec<ValidatorKeys>>,
    lambda: Option<Vec<ValidatorKeys>>,
    gamma_k: Option<Vec<ValidatorKeys>>,
    gamma_z: Option<BandersnatchVrfRoot>,
    gamma_s: Option<SealerSeries>,
    gamma_a: Option<Vec<Ticket>>,
    authorizations: Option<Authorizations>,
    rho: Option<Vec<Option<PendingReport>>>,
    beta: Option<RecentHistory>,
    delta: Option<ServiceMap>,
    chi: Option<Privileges>,
    psi: Option<Disputes>,
    pi: Option<Statistics>,
    vartheta: Option<Vec<Vec<ReadyEntry>>>,
    xi: Option<Vec<HashSet<Hash>>>,
    theta: Option<Vec<(ServiceId, Hash)>>,
}

impl<'a> StateTransition<'a> {
    pub fn new(base: &'a State) -> Self {
        Self {
            base,
            tau: None,
            eta: None,
            iota: None,
            kappa: None,
            lambda: None,
            gamma_k: None,
            gamma_z: None,
            gamma_s: None,
            gamma_a: None,
            authorizations: None,
            rho: None,
            beta: None,
            delta: None,
            chi: None,
            psi: None,
            pi: None,
            vartheta: None,
            xi: None,
            theta: None,
        }
    }

    pub fn base(&self) -> &'a State {
        self.base
    }

    ensure_get!(ensure_tau, get_tau, tau, TimeSlot);
    ensure_get!(ensure_eta, get_eta, eta, [Hash; 4]);
    ensure_get!(ensure_iota, get_iota, iota, Vec<ValidatorKeys>);
    ensure_get!(ensure_kappa, get_kappa, kappa, Vec<ValidatorKeys>);
    ensure_get!(ensure_lambda, get_lambda, lambda, Vec<ValidatorKeys>);
    ensure_get!(ensure_gamma_k, get_gamma_k, gamma_k, Vec<ValidatorKeys>);
    ensure_get!(ensure_gamma_z, get_gamma_z, gamma_z, BandersnatchVrfRoot);
    ensure_get!(ensure_gamma_s, get_gamma_s, gamma_s, SealerSeries);
    ensure_get!(ensure_gamma_a, get_gamma_a, gamma_a, Vec<Ticket>);
    ensure_get!(ensure_authorizations, get_authorizations, authorizations, Authorizations);
    ensure_get!(ensure_rho, get_rho, rho, Vec<Option<PendingReport>>);
    ensure_get!(ensure_beta, get_beta, beta, RecentHistory);
    ensure_get!(ensure_delta, get_delta, delta, ServiceMap);
    ensure_get!(ensure_chi, get_chi, chi, Privileges);
    ensure_get!(ensure_psi, get_psi, psi, Disputes);
    ensure_get!(ensure_pi, get_pi, pi, Statistics);
    ensure_get!(ensure_vartheta, get_vartheta, vartheta, Vec<Vec<ReadyEntry>>);
    ensure_get!(ensure_xi, get_xi, xi, Vec<HashSet<Hash>>);
    ensure_get!(ensure_theta, get_theta, theta, Vec<(ServiceId, Hash)>);

    /// Fold every touched prime into a fresh `State`, leaving untouched
    /// components as plain clones of `base`.
    pub fn merge_prime_onto_base(self) -> State {
        State {
            tau: self.tau.unwrap_or(self.base.tau),
            eta: self.eta.unwrap_or(self.base.eta),
            iota: self.iota.unwrap_or_else(|| self.base.iota.clone()),
            kappa: self.kappa.unwrap_or_else(|| self.base.kappa.clone()),
            lambda: self.lambda.unwrap_or_else(|| self.base.lambda.clone()),
            gamma_k: self.gamma_k.unwrap_or_else(|| self.base.gamma_k.clone()),
            gamma_z: self.gamma_z.unwrap_or(self.base.gamma_z),
            gamma_s: self.gamma_s.unwrap_or_else(|| self.base.gamma_s.clone()),
            gamma_a: self.gamma_a.unwrap_or_else(|| self.base.gamma_a.clone()),
            authorizations: self
                .authorizations
                .unwrap_or_else(|| self.base.authorizations.clone()),
            rho: self.rho.unwrap_or_else(|| self.base.rho.clone()),
            beta: self.beta.unwrap_or_else(|| self.base.beta.clone()),
            delta: self.delta.unwrap_or_else(|| self.base.delta.clone()),
            chi: self.chi.unwrap_or_else(|| self.base.chi.clone()),
            psi: self.psi.unwrap_or_else(|| self.base.psi.clone()),
            pi: self.pi.unwrap_or_else(|| self.base.pi.clone()),
            vartheta: self.vartheta.unwrap_or_else(|| self.base.vartheta.clone()),
            xi: self.xi.unwrap_or_else(|| self.base.xi.clone()),
            theta: self.theta.unwrap_or_else(|| self.base.theta.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn untouched_components_pass_through_unchanged() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let delta = StateTransition::new(&base);
        let merged = delta.merge_prime_onto_base();
        assert_eq!(merged, base);
    }

    #[test]
    fn ensure_clones_once_and_mutation_sticks() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let mut delta = StateTransition::new(&base);
        *delta.ensure_tau() = 7;
        assert_eq!(*delta.get_tau(), 7);
        let merged = delta.merge_prime_onto_base();
        assert_eq!(merged.tau, 7);
        assert_eq!(merged.eta, base.eta);
    }

    #[test]
    fn dropping_the_overlay_discards_primes() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        {
            let mut delta = StateTransition::new(&base);
            *delta.ensure_tau() = 99;
            // delta dropped here without merge_prime_onto_base
        }
        assert_eq!(base.tau, 0);
    }
}
