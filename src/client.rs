//! Confidential-client handles and the (client, tenant) handle cache.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TenantId, TokenSecret},
	error::ConfigError,
};

/// Reusable confidential-client handle bound to one tenant authority.
///
/// Building a handle performs no I/O; the token endpoint is only contacted when a grant
/// executes against it. Credentials and authority are fixed for the process lifetime,
/// so handles are safe to cache and share.
#[derive(Clone)]
pub struct ConfidentialClient {
	client_id: ClientId,
	client_secret: TokenSecret,
	tenant: TenantId,
	authority: Url,
	token_endpoint: Url,
}
impl ConfidentialClient {
	const TOKEN_ENDPOINT_PATH: &'static str = "oauth2/v2.0/token";

	/// Builds a handle for the provided credentials under the tenant's authority.
	pub fn build(
		client_id: ClientId,
		client_secret: TokenSecret,
		authority_base: &Url,
		tenant: TenantId,
	) -> Result<Self, ConfigError> {
		let authority = derive_authority(authority_base, &tenant)?;
		let token_endpoint = authority
			.join(Self::TOKEN_ENDPOINT_PATH)
			.map_err(|_| ConfigError::InvalidAuthority { tenant: tenant.to_string() })?;

		Ok(Self { client_id, client_secret, tenant, authority, token_endpoint })
	}

	/// OAuth 2.0 client identifier the handle authenticates as.
	pub fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	/// Client secret used for `client_secret_post` authentication.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}

	/// Tenant the authority was derived for.
	pub fn tenant(&self) -> &TenantId {
		&self.tenant
	}

	/// Tenant-qualified authority URL.
	pub fn authority(&self) -> &Url {
		&self.authority
	}

	/// Token endpoint all grants for this handle are posted to.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}
}
impl Debug for ConfidentialClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConfidentialClient")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("tenant", &self.tenant)
			.field("authority", &self.authority)
			.finish()
	}
}

/// Read-mostly cache of confidential-client handles keyed by (client id, tenant).
///
/// Lookups take a read lock; a miss builds the handle outside any lock and inserts with
/// insert-if-absent semantics. Two racing callers may build the same handle twice; the
/// first insert wins and the duplicate is dropped, which is harmless because building
/// is pure. Entries have no expiry—credentials do not rotate within a process.
pub struct ClientCache {
	authority_base: Url,
	handles: RwLock<HashMap<(ClientId, TenantId), Arc<ConfidentialClient>>>,
}
impl ClientCache {
	/// Creates an empty cache deriving authorities from the provided base URL.
	pub fn new(authority_base: Url) -> Self {
		Self { authority_base, handles: RwLock::new(HashMap::new()) }
	}

	/// Returns the cached handle for the (client id, tenant) pair, building it on a miss.
	pub fn get_or_build(
		&self,
		client_id: &ClientId,
		client_secret: &TokenSecret,
		tenant: &TenantId,
	) -> Result<Arc<ConfidentialClient>, ConfigError> {
		let key = (client_id.clone(), tenant.clone());

		if let Some(handle) = self.handles.read().get(&key) {
			return Ok(handle.clone());
		}

		let handle = Arc::new(ConfidentialClient::build(
			client_id.clone(),
			client_secret.clone(),
			&self.authority_base,
			tenant.clone(),
		)?);

		Ok(self.handles.write().entry(key).or_insert(handle).clone())
	}

	/// Number of cached handles.
	pub fn len(&self) -> usize {
		self.handles.read().len()
	}

	/// Returns true when no handle has been built yet.
	pub fn is_empty(&self) -> bool {
		self.handles.read().is_empty()
	}
}
impl Debug for ClientCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCache")
			.field("authority_base", &self.authority_base)
			.field("handles", &self.len())
			.finish()
	}
}

fn derive_authority(base: &Url, tenant: &TenantId) -> Result<Url, ConfigError> {
	// Identifier validation already rejects whitespace; path and fragment separators
	// would silently re-root the authority, so they are rejected here.
	if tenant.contains(['/', '?', '#']) {
		return Err(ConfigError::InvalidAuthority { tenant: tenant.to_string() });
	}

	let authority = base
		.join(&format!("{tenant}/"))
		.map_err(|_| ConfigError::InvalidAuthority { tenant: tenant.to_string() })?;

	if authority.host_str() != base.host_str()
		|| !authority.path().ends_with(&format!("/{tenant}/"))
	{
		return Err(ConfigError::InvalidAuthority { tenant: tenant.to_string() });
	}

	Ok(authority)
}
