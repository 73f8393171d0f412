//! Typed exchange-request parsing and validation.
//!
//! Replaces the loosely shaped JSON the original callers sent with a schema-validated
//! structure: unknown fields are rejected at deserialization time and every required
//! field is checked before any provider call is made.

// crates.io
use serde::de::{self, Deserializer, SeqAccess, Visitor};
// self
use crate::{
	_prelude::*,
	auth::{TenantId, UserAssertion},
	error::ValidationError,
};

/// Raw exchange request as deserialized from the caller's JSON body.
///
/// Field names mirror the wire schema (`tenantId`, `token`, `resources`, `orgUrl`);
/// unknown fields are rejected outright so malformed callers fail before reaching the
/// engine.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ExchangeRequest {
	/// Directory (tenant) to run the exchange against.
	#[serde(default)]
	pub tenant_id: Option<String>,
	/// Inbound user assertion to exchange.
	#[serde(default)]
	pub token: Option<String>,
	/// Requested resource keywords.
	#[serde(default)]
	pub resources: Option<ResourceList>,
	/// Organization URL for resources whose scope derives from it.
	#[serde(default)]
	pub org_url: Option<String>,
}
impl ExchangeRequest {
	/// Validates required fields and produces the engine's [`TokenRequest`].
	///
	/// Every missing required field is collected into one message before the request is
	/// rejected, so callers learn the full shape problem in a single round trip.
	pub fn validate(self) -> Result<TokenRequest, ValidationError> {
		let mut missing = Vec::new();
		let tenant_view = self.tenant_id.as_deref().map(str::trim).unwrap_or_default();
		let token_view = self.token.as_deref().unwrap_or_default();
		let resources = self.resources.map(ResourceList::into_inner).unwrap_or_default();

		if tenant_view.is_empty() {
			missing.push("tenantId");
		}
		if token_view.trim().is_empty() {
			missing.push("token");
		}
		if resources.is_empty() {
			missing.push("resources");
		}
		if !missing.is_empty() {
			return Err(ValidationError::MissingFields { fields: missing });
		}

		let tenant = TenantId::new(tenant_view)
			.map_err(|source| ValidationError::InvalidTenant { source })?;
		let org_url = match self.org_url.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
			Some(raw) => Some(
				Url::parse(raw).map_err(|source| ValidationError::InvalidOrgUrl { source })?,
			),
			None => None,
		};

		Ok(TokenRequest {
			tenant,
			assertion: UserAssertion::new(token_view),
			resources,
			org_url,
		})
	}
}
impl Debug for ExchangeRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangeRequest")
			.field("tenant_id", &self.tenant_id)
			.field("token", &self.token.as_ref().map(|_| "<redacted>"))
			.field("resources", &self.resources)
			.field("org_url", &self.org_url)
			.finish()
	}
}

/// Ordered list of requested resource keywords.
///
/// Accepts either a JSON array of strings or the single delimited string older callers
/// send (`"graph,dataverse"`); both normalize to an ordered list of trimmed keywords.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceList(Vec<String>);
impl ResourceList {
	/// Builds a list from any iterator of keywords, dropping empty entries.
	pub fn new<I, S>(items: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self(
			items
				.into_iter()
				.map(|item| item.as_ref().trim().to_owned())
				.filter(|item| !item.is_empty())
				.collect(),
		)
	}

	/// Number of keywords.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no keyword survived normalization.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over the keywords in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|s| s.as_str())
	}

	/// Consumes the list into its keywords.
	pub fn into_inner(self) -> Vec<String> {
		self.0
	}
}
impl<'de> Deserialize<'de> for ResourceList {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct ResourceListVisitor;
		impl<'de> Visitor<'de> for ResourceListVisitor {
			type Value = ResourceList;

			fn expecting(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("a resource keyword string or an array of resource keywords")
			}

			fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
			where
				E: de::Error,
			{
				Ok(ResourceList(split_keywords(value)))
			}

			fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
			where
				A: SeqAccess<'de>,
			{
				let mut items = Vec::new();

				while let Some(value) = seq.next_element::<String>()? {
					let trimmed = value.trim();

					if !trimmed.is_empty() {
						items.push(trimmed.to_owned());
					}
				}

				Ok(ResourceList(items))
			}
		}

		deserializer.deserialize_any(ResourceListVisitor)
	}
}

/// Validated exchange request consumed by the engine.
#[derive(Clone, Debug)]
pub struct TokenRequest {
	/// Tenant the exchange runs against.
	pub tenant: TenantId,
	/// Inbound user assertion to exchange (never echoed back).
	pub assertion: UserAssertion,
	/// Ordered resource keywords to resolve, matched case-insensitively.
	pub resources: Vec<String>,
	/// Organization URL for resources whose scope derives from it.
	pub org_url: Option<Url>,
}

fn split_keywords(value: &str) -> Vec<String> {
	value.split([',', ';']).flat_map(str::split_whitespace).map(str::to_owned).collect()
}
