//! Per-resource outcomes, aggregation policy, and serializable response payloads.

// crates.io
use serde::ser::{SerializeMap, Serializer};
// self
use crate::{
	_prelude::*,
	auth::{AcquiredToken, ResourceKey, TokenSecret},
	error::ProviderError,
};

/// Outcome of one requested resource within an exchange.
#[derive(Clone, Debug)]
pub enum AcquisitionOutcome {
	/// Token acquired for a resolved resource.
	Acquired {
		/// Canonical resource key.
		key: ResourceKey,
		/// Token minted by the provider.
		token: AcquiredToken,
	},
	/// Requested name matched no resolver entry; omitted from the response.
	Skipped {
		/// The raw requested name.
		requested: String,
	},
	/// Provider rejected the acquisition for a resolved resource.
	Failed {
		/// Canonical resource key.
		key: ResourceKey,
		/// Typed provider failure.
		error: ProviderError,
	},
}

/// Policy deciding how per-resource failures affect the aggregate response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AggregationPolicy {
	/// The first provider failure fails the whole exchange and discards partial tokens.
	#[default]
	FailFast,
	/// Keep successful entries; fail only when nothing succeeded and something failed.
	Partial,
}

/// Mapping from resource key to acquired access token, in request order.
///
/// Serializes as `{"<key>Token": "<access-token>"}` fields. Only resources that were
/// both requested and successfully acquired appear; the inbound assertion is never part
/// of the payload.
#[derive(Clone, Debug, Default)]
pub struct TokenResponse {
	entries: Vec<(ResourceKey, TokenSecret)>,
}
impl TokenResponse {
	/// Returns true when no resource produced a token.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Number of token entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Looks up the token acquired for a resource key.
	pub fn token(&self, key: &str) -> Option<&TokenSecret> {
		self.entries.iter().find(|(entry, _)| entry.as_ref() == key).map(|(_, token)| token)
	}

	/// Iterator over resource keys in request order.
	pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
		self.entries.iter().map(|(key, _)| key)
	}

	fn push(&mut self, key: ResourceKey, token: TokenSecret) {
		self.entries.push((key, token));
	}
}
impl Serialize for TokenResponse {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;

		for (key, token) in &self.entries {
			map.serialize_entry(&format!("{key}Token"), token.expose())?;
		}

		map.end()
	}
}

/// Response payload of the app-only flow.
#[derive(Clone, Debug, Serialize)]
pub struct AppTokenResponse {
	/// Access token bound to the application's own identity.
	pub token: TokenSecret,
}

/// Merges per-resource outcomes into a response under the chosen policy.
pub fn aggregate(
	outcomes: Vec<AcquisitionOutcome>,
	policy: AggregationPolicy,
) -> Result<TokenResponse, ProviderError> {
	let mut response = TokenResponse::default();
	let mut first_failure: Option<ProviderError> = None;

	for outcome in outcomes {
		match outcome {
			AcquisitionOutcome::Acquired { key, token } =>
				response.push(key, token.access_token),
			AcquisitionOutcome::Skipped { .. } => {},
			AcquisitionOutcome::Failed { error, .. } => match policy {
				AggregationPolicy::FailFast => return Err(error),
				AggregationPolicy::Partial =>
					if first_failure.is_none() {
						first_failure = Some(error);
					},
			},
		}
	}

	match (response.is_empty(), first_failure) {
		(true, Some(error)) => Err(error),
		_ => Ok(response),
	}
}
