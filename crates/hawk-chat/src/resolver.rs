//! Decides which side owes the next reply on a thread.

use hawk_core::config::AnalysisConfig;
use hawk_core::types::{
    domain_matches, extract_domain, extract_email_address, is_well_formed_domain,
    CommunicationRecord, WaitingOn,
};

/// How an address relates to the organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainClass {
    Internal,
    External,
    /// Malformed address, or a domain outside every recognized pattern.
    Unrecognized,
}

/// Who owes the next message and, when known, which address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Responsibility {
    pub waiting_on: WaitingOn,
    pub party: Option<String>,
}

impl Responsibility {
    fn unknown() -> Self {
        Self {
            waiting_on: WaitingOn::Unknown,
            party: None,
        }
    }
}

/// Classifies senders against the organization's domains.
#[derive(Debug, Clone)]
pub struct ResponsibilityResolver {
    internal_domains: Vec<String>,
    external_domains: Vec<String>,
}

impl ResponsibilityResolver {
    /// `external_domains` empty means any well-formed non-internal domain is
    /// external.
    pub fn new(internal_domains: Vec<String>, external_domains: Vec<String>) -> Self {
        Self {
            internal_domains: clean_domains(internal_domains),
            external_domains: clean_domains(external_domains),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.internal_domains.clone(),
            config.external_domains.clone(),
        )
    }

    pub fn internal_domains(&self) -> &[String] {
        &self.internal_domains
    }

    /// Classify a bare domain.
    pub fn classify_domain(&self, domain: &str) -> DomainClass {
        let domain = domain.trim().to_lowercase();
        if !is_well_formed_domain(&domain) {
            return DomainClass::Unrecognized;
        }
        if self
            .internal_domains
            .iter()
            .any(|d| domain_matches(&domain, d))
        {
            return DomainClass::Internal;
        }
        if self.external_domains.is_empty()
            || self
                .external_domains
                .iter()
                .any(|d| domain_matches(&domain, d))
        {
            return DomainClass::External;
        }
        DomainClass::Unrecognized
    }

    /// Classify an address or `"Name <addr>"` header.
    pub fn classify_address(&self, field: &str) -> DomainClass {
        match extract_domain(field) {
            Some(domain) => self.classify_domain(&domain),
            None => DomainClass::Unrecognized,
        }
    }

    /// Decide who owes a reply to the most recent message of a thread.
    ///
    /// An internal sender leaves the thread waiting on the outside party
    /// (the last external recipient is named when present); an external
    /// sender leaves it waiting on the organization. Anything that cannot
    /// be classified is `Unknown`; this never fails.
    pub fn resolve(&self, representative: &CommunicationRecord) -> Responsibility {
        let Some(sender) = representative.sender.as_deref() else {
            return Responsibility::unknown();
        };

        match self.classify_address(sender) {
            DomainClass::Internal => Responsibility {
                waiting_on: WaitingOn::External,
                party: self.last_recipient_of(representative, DomainClass::External),
            },
            DomainClass::External => Responsibility {
                waiting_on: WaitingOn::Internal,
                party: self.last_recipient_of(representative, DomainClass::Internal),
            },
            DomainClass::Unrecognized => Responsibility::unknown(),
        }
    }

    fn last_recipient_of(&self, record: &CommunicationRecord, class: DomainClass) -> Option<String> {
        record
            .recipients
            .iter()
            .rev()
            .find(|r| self.classify_address(r) == class)
            .and_then(|r| extract_email_address(r))
    }
}

fn clean_domains(domains: Vec<String>) -> Vec<String> {
    domains
        .into_iter()
        .map(|d| d.trim().trim_start_matches('@').to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}
