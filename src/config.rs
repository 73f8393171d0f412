//! Explicit engine configuration assembled by the hosting collaborator.
//!
//! The engine never reads environment variables itself; the host loads the client
//! credentials once at startup and hands them over at construction time, which keeps
//! the core testable without environment mutation.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, TenantId, TokenSecret},
	error::ConfigError,
};

/// Immutable process-wide configuration consumed by the engine.
#[derive(Clone)]
pub struct EngineConfig {
	/// OAuth 2.0 client identifier of the confidential application.
	pub client_id: ClientId,
	/// Client secret proving the application's identity to the provider.
	pub client_secret: TokenSecret,
	/// Authority base URL that tenant-qualified authorities are derived from.
	pub authority: Url,
	/// Tenant the app-only flow authenticates against.
	pub app_tenant: Option<TenantId>,
	/// Base resource URL whose default scope the app-only flow requests.
	pub app_resource: Option<Url>,
	/// Bounded timeout applied to each token endpoint call.
	pub request_timeout: StdDuration,
}
impl EngineConfig {
	/// Default authority base for the Microsoft identity platform.
	pub const DEFAULT_AUTHORITY: &'static str = "https://login.microsoftonline.com";
	/// Default per-acquisition timeout.
	pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates a new builder seeded with the confidential client credentials.
	pub fn builder(client_id: ClientId, client_secret: impl Into<String>) -> EngineConfigBuilder {
		EngineConfigBuilder {
			client_id,
			client_secret: TokenSecret::new(client_secret),
			authority: None,
			app_tenant: None,
			app_resource: None,
			request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_authority(&self.authority)?;

		if self.request_timeout.is_zero() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}
impl Debug for EngineConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EngineConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("authority", &self.authority)
			.field("app_tenant", &self.app_tenant)
			.field("app_resource", &self.app_resource)
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}

/// Builder for [`EngineConfig`] values.
#[derive(Debug)]
pub struct EngineConfigBuilder {
	client_id: ClientId,
	client_secret: TokenSecret,
	authority: Option<Url>,
	app_tenant: Option<TenantId>,
	app_resource: Option<Url>,
	request_timeout: StdDuration,
}
impl EngineConfigBuilder {
	/// Overrides the authority base URL (defaults to the Microsoft identity platform).
	pub fn authority(mut self, url: Url) -> Self {
		self.authority = Some(url);

		self
	}

	/// Sets the tenant the app-only flow authenticates against.
	pub fn app_tenant(mut self, tenant: TenantId) -> Self {
		self.app_tenant = Some(tenant);

		self
	}

	/// Sets the base resource URL the app-only flow derives its default scope from.
	pub fn app_resource(mut self, url: Url) -> Self {
		self.app_resource = Some(url);

		self
	}

	/// Overrides the per-acquisition timeout (defaults to 30 seconds).
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<EngineConfig, ConfigError> {
		let authority = match self.authority {
			Some(url) => url,
			None => Url::parse(EngineConfig::DEFAULT_AUTHORITY).map_err(|_| {
				ConfigError::InvalidAuthorityBase { url: EngineConfig::DEFAULT_AUTHORITY.into() }
			})?,
		};
		let config = EngineConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			authority,
			app_tenant: self.app_tenant,
			app_resource: self.app_resource,
			request_timeout: self.request_timeout,
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_authority(url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		return Err(ConfigError::InsecureAuthority { url: url.to_string() });
	}
	if url.host_str().is_none() {
		return Err(ConfigError::InvalidAuthorityBase { url: url.to_string() });
	}

	Ok(())
}
