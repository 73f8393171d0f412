//! Resource-to-scope resolution.
//!
//! Maps requested resource keywords onto the scope URI the identity provider expects.
//! Matching is case-insensitive substring matching over a static table; unknown
//! keywords are skipped rather than failing the exchange, while recognized keywords
//! missing a required parameter (the organization URL) are hard errors.

// self
use crate::{
	_prelude::*,
	auth::{ResourceKey, ScopeSet},
	error::ResolutionError,
};

/// Target scope a resolver entry maps to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeTarget {
	/// Fixed scope URI requested verbatim.
	Fixed(String),
	/// `<organizationUrl>/.default`, requiring the request's organization URL.
	OrganizationDefault,
}

/// One row of the resolver table: a match keyword and the scope it resolves to.
#[derive(Clone, Debug)]
pub struct ScopeSpec {
	key: ResourceKey,
	keyword: String,
	target: ScopeTarget,
}
impl ScopeSpec {
	/// Creates an entry; the keyword is matched case-insensitively.
	pub fn new(key: ResourceKey, keyword: impl Into<String>, target: ScopeTarget) -> Self {
		Self { key, keyword: keyword.into().to_ascii_lowercase(), target }
	}

	/// Canonical resource key this entry resolves to.
	pub fn key(&self) -> &ResourceKey {
		&self.key
	}
}

/// Scope resolved for one requested resource.
#[derive(Clone, Debug)]
pub struct ResolvedScope {
	/// Canonical resource key used in the response payload.
	pub key: ResourceKey,
	/// Scope to request from the provider.
	pub scope: ScopeSet,
}

/// Static, read-only resolver mapping resource keywords to scopes.
#[derive(Clone, Debug)]
pub struct ScopeResolver {
	entries: Vec<ScopeSpec>,
}
impl ScopeResolver {
	/// Default scope of the Microsoft Graph API.
	pub const GRAPH_SCOPE: &'static str = "https://graph.microsoft.com/.default";

	/// Creates a resolver from an explicit table.
	pub fn new(entries: Vec<ScopeSpec>) -> Self {
		Self { entries }
	}

	/// Appends an entry, e.g. a deployment-specific fixed-scope resource.
	pub fn with_entry(mut self, spec: ScopeSpec) -> Self {
		self.entries.push(spec);

		self
	}

	/// Resolves one requested resource name against the table.
	///
	/// Every entry whose keyword occurs in the name resolves, so a single name can fan
	/// out to several resources just like the delimited strings older callers send. An
	/// empty result means the name matched nothing and the resource is skipped.
	pub fn resolve(
		&self,
		requested: &str,
		org_url: Option<&Url>,
	) -> Result<Vec<ResolvedScope>, ResolutionError> {
		let needle = requested.to_ascii_lowercase();
		let mut resolved = Vec::new();

		for entry in &self.entries {
			if !needle.contains(&entry.keyword) {
				continue;
			}

			let scope = match &entry.target {
				ScopeTarget::Fixed(scope) => ScopeSet::single(scope.clone()),
				ScopeTarget::OrganizationDefault => {
					let org = org_url.ok_or_else(|| ResolutionError::MissingOrganizationUrl {
						resource: entry.key.clone(),
					})?;

					ScopeSet::single(default_scope_of(org))
				},
			}
			.map_err(|source| ResolutionError::InvalidScope {
				resource: entry.key.clone(),
				source,
			})?;

			resolved.push(ResolvedScope { key: entry.key.clone(), scope });
		}

		Ok(resolved)
	}
}
impl Default for ScopeResolver {
	fn default() -> Self {
		Self::new(vec![
			ScopeSpec::new(
				builtin_key("graph"),
				"graph",
				ScopeTarget::Fixed(Self::GRAPH_SCOPE.into()),
			),
			ScopeSpec::new(builtin_key("dataverse"), "dataverse", ScopeTarget::OrganizationDefault),
		])
	}
}

/// Returns the `.default` scope URI for a resource base URL.
pub fn default_scope_of(resource: &Url) -> String {
	format!("{}/.default", resource.as_str().trim_end_matches('/'))
}

fn builtin_key(value: &'static str) -> ResourceKey {
	ResourceKey::new(value).expect("Built-in resource keys are valid.")
}
