//! Lookup resolver
//!
//! Resolves an existing remote object from filter criteria so that other
//! declarations can reference it. Lookups are read-only: one listing call,
//! client-side exact matching, then the configured [`SelectionPolicy`].

use crate::client::{Account, IncomingPhoneNumber, MessagingService, Page, Params};
use crate::codec::{AttributeCodec, MessagingServiceCodec, PhoneNumberCodec, SubaccountCodec};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::kind::ResourceKind;
use crate::store::{ConfigStore, ResourceData};
use serde::{Deserialize, Serialize};
use std::fmt;
use telflow_config::SelectionPolicy;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    FriendlyName,
    Number,
    Search,
    AreaCode,
}

impl Criterion {
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::FriendlyName => "friendly_name",
            Criterion::Number => "number",
            Criterion::Search => "search",
            Criterion::AreaCode => "area_code",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Filter criteria, each optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
}

impl LookupQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn friendly_name(mut self, value: impl Into<String>) -> Self {
        self.friendly_name = Some(value.into());
        self
    }

    pub fn number(mut self, value: impl Into<String>) -> Self {
        self.number = Some(value.into());
        self
    }

    pub fn search(mut self, value: impl Into<String>) -> Self {
        self.search = Some(value.into());
        self
    }

    pub fn area_code(mut self, value: impl Into<String>) -> Self {
        self.area_code = Some(value.into());
        self
    }

    /// Value of a criterion; blank counts as absent
    pub fn get(&self, criterion: Criterion) -> Option<&str> {
        let value = match criterion {
            Criterion::FriendlyName => &self.friendly_name,
            Criterion::Number => &self.number,
            Criterion::Search => &self.search,
            Criterion::AreaCode => &self.area_code,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    fn present(&self) -> impl Iterator<Item = (Criterion, &str)> {
        [
            Criterion::Number,
            Criterion::FriendlyName,
            Criterion::Search,
            Criterion::AreaCode,
        ]
        .into_iter()
        .filter_map(|c| self.get(c).map(|v| (c, v)))
    }
}

/// Criteria a kind can be looked up by
#[derive(Debug, Clone, Copy)]
pub struct LookupSurface {
    /// Matched client-side against candidate fields, case-sensitive
    pub exact: &'static [Criterion],
    /// Passed to the listing endpoint and trusted
    pub server_side: &'static [Criterion],
    /// At least one of these must be present
    pub required_any: &'static [Criterion],
}

impl LookupSurface {
    pub fn for_kind(kind: ResourceKind) -> Option<LookupSurface> {
        match kind {
            ResourceKind::PhoneNumber => Some(LookupSurface {
                exact: &[Criterion::Number, Criterion::FriendlyName],
                server_side: &[Criterion::Search, Criterion::AreaCode],
                required_any: &[Criterion::Number, Criterion::FriendlyName],
            }),
            ResourceKind::MessagingService | ResourceKind::Subaccount => Some(LookupSurface {
                exact: &[Criterion::FriendlyName],
                server_side: &[],
                required_any: &[Criterion::FriendlyName],
            }),
            ResourceKind::ApiKey => None,
        }
    }

    fn supports(&self, criterion: Criterion) -> bool {
        self.exact.contains(&criterion) || self.server_side.contains(&criterion)
    }

    /// Reject unsupported criteria and a query with none of the required ones
    pub fn validate(&self, kind: ResourceKind, query: &LookupQuery) -> Result<()> {
        if let Some((criterion, _)) = query.present().find(|(c, _)| !self.supports(*c)) {
            return Err(ProviderError::validation(
                kind,
                format!("'{}' is not a lookup criterion", criterion),
            ));
        }
        if !self.required_any.iter().any(|c| query.get(*c).is_some()) {
            let names: Vec<&str> = self.required_any.iter().map(Criterion::name).collect();
            return Err(ProviderError::validation(
                kind,
                format!("one of [{}] must be set", names.join(", ")),
            ));
        }
        Ok(())
    }
}

/// Remote object that can be matched against exact criteria
trait Candidate {
    fn sid(&self) -> &str;

    fn field(&self, criterion: Criterion) -> Option<&str>;

    /// Client-side check of a server-side criterion that could not be sent
    fn satisfies(&self, _criterion: Criterion, _wanted: &str) -> bool {
        true
    }
}

impl Candidate for IncomingPhoneNumber {
    fn sid(&self) -> &str {
        &self.sid
    }

    fn field(&self, criterion: Criterion) -> Option<&str> {
        match criterion {
            Criterion::Number => Some(&self.phone_number),
            Criterion::FriendlyName => Some(&self.friendly_name),
            _ => None,
        }
    }

    fn satisfies(&self, criterion: Criterion, wanted: &str) -> bool {
        match criterion {
            Criterion::Search => self.phone_number.contains(wanted),
            Criterion::AreaCode => has_area_code(&self.phone_number, wanted),
            _ => true,
        }
    }
}

/// Whether the national part of an E.164 number starts with `area_code`.
/// NANP numbers (`+1`) drop the one-digit country code; other numbers are
/// tried with country codes of one to three digits.
fn has_area_code(phone_number: &str, area_code: &str) -> bool {
    let digits = phone_number.trim_start_matches('+');
    if let Some(national) = digits.strip_prefix('1') {
        return national.starts_with(area_code);
    }
    (1..=3).any(|cc| digits.get(cc..).is_some_and(|national| national.starts_with(area_code)))
}

impl Candidate for MessagingService {
    fn sid(&self) -> &str {
        &self.sid
    }

    fn field(&self, criterion: Criterion) -> Option<&str> {
        match criterion {
            Criterion::FriendlyName => Some(&self.friendly_name),
            _ => None,
        }
    }
}

impl Candidate for Account {
    fn sid(&self) -> &str {
        &self.sid
    }

    fn field(&self, criterion: Criterion) -> Option<&str> {
        match criterion {
            Criterion::FriendlyName => Some(&self.friendly_name),
            _ => None,
        }
    }
}

/// `unable to find phone number with number: X and friendly_name: Y`
fn describe_query(kind: ResourceKind, surface: &LookupSurface, query: &LookupQuery) -> String {
    let criteria: Vec<String> = surface
        .exact
        .iter()
        .filter_map(|c| query.get(*c).map(|v| format!("{}: {}", c, v)))
        .collect();
    format!("unable to find {} with {}", kind.label(), criteria.join(" and "))
}

pub struct LookupResolver<'a> {
    ctx: &'a ProviderContext,
}

impl<'a> LookupResolver<'a> {
    pub fn new(ctx: &'a ProviderContext) -> Self {
        Self { ctx }
    }

    /// Resolve `query` to a single remote object of `kind` and return it as
    /// a record carrying its id.
    pub async fn resolve(&self, kind: ResourceKind, query: &LookupQuery) -> Result<ResourceData> {
        let surface =
            LookupSurface::for_kind(kind).ok_or_else(|| ProviderError::unsupported(kind, "lookup"))?;
        surface.validate(kind, query)?;

        let (filter, sent) = self.filter_params(kind, query);
        let unsent: Vec<Criterion> = surface
            .server_side
            .iter()
            .copied()
            .filter(|c| query.get(*c).is_some() && sent != Some(*c))
            .collect();
        let client = self.ctx.client();
        let policy = self.ctx.selection_policy();

        debug!(
            account_sid = self.ctx.account_sid(),
            kind = %kind,
            "START lookup"
        );

        let mut data = ResourceData::new(kind);
        match kind {
            ResourceKind::PhoneNumber => {
                let page = client.list_phone_numbers(&filter).await;
                let page = page.map_err(|e| not_found(kind, &surface, query, Some(e)))?;
                warn_if_truncated(kind, &page);
                let found = select(kind, &surface, &unsent, query, policy, page.items)?;
                data.set_id(Some(found.sid.clone()));
                PhoneNumberCodec::decode(&found, &mut data)?;
            }
            ResourceKind::MessagingService => {
                let page = client.list_messaging_services(&filter).await;
                let page = page.map_err(|e| not_found(kind, &surface, query, Some(e)))?;
                warn_if_truncated(kind, &page);
                let found = select(kind, &surface, &unsent, query, policy, page.items)?;
                data.set_id(Some(found.sid.clone()));
                MessagingServiceCodec::decode(&found, &mut data)?;
            }
            ResourceKind::Subaccount => {
                let page = client.list_accounts(&filter).await;
                let page = page.map_err(|e| not_found(kind, &surface, query, Some(e)))?;
                warn_if_truncated(kind, &page);
                let found = select(kind, &surface, &unsent, query, policy, page.items)?;
                data.set_id(Some(found.sid.clone()));
                SubaccountCodec::decode(&found, &mut data)?;
            }
            ResourceKind::ApiKey => return Err(ProviderError::unsupported(kind, "lookup")),
        }

        debug!(
            account_sid = self.ctx.account_sid(),
            sid = data.id().unwrap_or_default(),
            "END lookup"
        );
        Ok(data)
    }

    /// Listing filter built from the present criteria, plus the criterion
    /// sent as the number pattern.
    ///
    /// The listing endpoint filters numbers with a single `PhoneNumber`
    /// pattern, so an exact number wins over the search substring, which
    /// wins over the area code. Server-side criteria left out of the filter
    /// are checked client-side by `select`.
    fn filter_params(&self, kind: ResourceKind, query: &LookupQuery) -> (Params, Option<Criterion>) {
        let mut params = Params::new();
        if let Some(name) = query.get(Criterion::FriendlyName) {
            params.add("FriendlyName", name);
        }
        let mut sent = None;
        if kind == ResourceKind::PhoneNumber {
            let pattern = [Criterion::Number, Criterion::Search, Criterion::AreaCode]
                .into_iter()
                .find_map(|c| query.get(c).map(|v| (c, v)));
            if let Some((criterion, pattern)) = pattern {
                params.add("PhoneNumber", pattern);
                sent = Some(criterion);
            }
        }
        (params, sent)
    }
}

/// Only the first page is examined
fn warn_if_truncated<T>(kind: ResourceKind, page: &Page<T>) {
    if let Some(next) = page.next_page_uri.as_deref() {
        warn!(
            kind = %kind,
            examined = page.items.len(),
            next_page = next,
            "Lookup matched more objects than fit on one page; later pages are not examined"
        );
    }
}

fn not_found(
    kind: ResourceKind,
    surface: &LookupSurface,
    query: &LookupQuery,
    cause: Option<crate::client::ApiError>,
) -> ProviderError {
    let mut message = describe_query(kind, surface, query);
    if let Some(cause) = cause {
        message = format!("{}: {}", message, cause);
    }
    ProviderError::NotFound { kind, message }
}

fn select<T: Candidate>(
    kind: ResourceKind,
    surface: &LookupSurface,
    unsent: &[Criterion],
    query: &LookupQuery,
    policy: SelectionPolicy,
    candidates: Vec<T>,
) -> Result<T> {
    let total = candidates.len();
    let mut matches: Vec<T> = candidates
        .into_iter()
        .filter(|candidate| {
            surface.exact.iter().all(|criterion| match query.get(*criterion) {
                Some(wanted) => candidate.field(*criterion) == Some(wanted),
                None => true,
            }) && unsent.iter().all(|criterion| match query.get(*criterion) {
                Some(wanted) => candidate.satisfies(*criterion, wanted),
                None => true,
            })
        })
        .collect();

    debug!(kind = %kind, total, matched = matches.len(), "Filtered lookup candidates");

    if matches.len() > 1 && policy == SelectionPolicy::FailOnMultiple {
        let sids: Vec<&str> = matches.iter().map(Candidate::sid).collect();
        return Err(ProviderError::Ambiguous {
            kind,
            message: format!(
                "{} matched {} objects ({})",
                describe_query(kind, surface, query).replacen("unable to find", "lookup for", 1),
                matches.len(),
                sids.join(", ")
            ),
        });
    }

    if matches.is_empty() {
        return Err(not_found(kind, surface, query, None));
    }
    Ok(matches.remove(0))
}
