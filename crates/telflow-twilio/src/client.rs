//! Twilio REST API client
//!
//! Implements [`ProviderClient`] against the 2010-04-01 core API (numbers,
//! accounts, keys) and the v1 messaging API (services and their sender
//! pools). Every method is one HTTP request with HTTP basic auth; failures
//! are classified into [`ApiErrorKind`](telflow_provider::ApiErrorKind)s.

use crate::error::{Result, TwilioError};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use telflow_config::ProviderConfig;
use telflow_provider::client::{
    Account, ApiKey, AvailableNumber, IncomingPhoneNumber, MessagingService,
};
use telflow_provider::{ApiResult, Page, Params, ProviderClient};
use tracing::debug;

pub const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
pub const TWILIO_MESSAGING_BASE: &str = "https://messaging.twilio.com/v1";

/// Page size of listing requests
const PAGE_SIZE: &str = "50";

#[derive(Debug, Deserialize)]
struct AvailableNumbersPage {
    #[serde(default)]
    available_phone_numbers: Vec<AvailableNumber>,
}

#[derive(Debug, Deserialize)]
struct IncomingNumbersPage {
    #[serde(default)]
    incoming_phone_numbers: Vec<IncomingPhoneNumber>,
    next_page_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsPage {
    #[serde(default)]
    accounts: Vec<Account>,
    next_page_uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    next_page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServicesPage {
    #[serde(default)]
    services: Vec<MessagingService>,
    #[serde(default)]
    meta: Meta,
}

pub struct TwilioClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    api_base: String,
    messaging_base: String,
}

impl TwilioClient {
    /// Client for the account in `config`. An `endpoint` override replaces
    /// both API hosts (the path layout stays the same).
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let (api_base, messaging_base) = match config.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                let endpoint = endpoint.trim().trim_end_matches('/');
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err(TwilioError::InvalidEndpoint(endpoint.to_string()));
                }
                (
                    format!("{}/2010-04-01", endpoint),
                    format!("{}/v1", endpoint),
                )
            }
            _ => (
                TWILIO_API_BASE.to_string(),
                TWILIO_MESSAGING_BASE.to_string(),
            ),
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("telflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            api_base,
            messaging_base,
        })
    }

    /// `{base}/Accounts/{account}/{path}.json`
    fn account_url(&self, path: &str) -> String {
        format!(
            "{}/Accounts/{}/{}.json",
            self.api_base, self.account_sid, path
        )
    }

    fn accounts_url(&self, sid: Option<&str>) -> String {
        match sid {
            Some(sid) => format!("{}/Accounts/{}.json", self.api_base, sid),
            None => format!("{}/Accounts.json", self.api_base),
        }
    }

    fn services_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/Services", self.messaging_base)
        } else {
            format!("{}/Services/{}", self.messaging_base, path)
        }
    }

    fn listing_filter(filter: &Params) -> Params {
        let mut query = filter.clone();
        query.set("PageSize", PAGE_SIZE);
        query
    }

    async fn execute(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String> {
        let response = request
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(url, status = status.as_u16(), "Twilio response");

        if !status.is_success() {
            return Err(TwilioError::from_response(status.as_u16(), &body));
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: Option<&Params>) -> Result<T> {
        debug!(url, "GET");
        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let body = self.execute(request, url).await?;
        decode(url, &body)
    }

    async fn post<T: DeserializeOwned>(&self, url: &str, form: &Params) -> Result<T> {
        debug!(url, params = form.len(), "POST");
        let body = self.execute(self.http.post(url).form(form), url).await?;
        decode(url, &body)
    }

    async fn post_discard(&self, url: &str, form: &Params) -> Result<()> {
        debug!(url, params = form.len(), "POST");
        self.execute(self.http.post(url).form(form), url).await?;
        Ok(())
    }

    async fn delete(&self, url: &str) -> Result<()> {
        debug!(url, "DELETE");
        self.execute(self.http.delete(url), url).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| TwilioError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl ProviderClient for TwilioClient {
    async fn search_local_numbers(
        &self,
        country_code: &str,
        filter: &Params,
    ) -> ApiResult<Vec<AvailableNumber>> {
        let url = self.account_url(&format!("AvailablePhoneNumbers/{}/Local", country_code));
        let page: AvailableNumbersPage = self.get(&url, Some(filter)).await?;
        Ok(page.available_phone_numbers)
    }

    async fn create_phone_number(&self, params: &Params) -> ApiResult<IncomingPhoneNumber> {
        let url = self.account_url("IncomingPhoneNumbers");
        Ok(self.post(&url, params).await?)
    }

    async fn get_phone_number(&self, sid: &str) -> ApiResult<IncomingPhoneNumber> {
        let url = self.account_url(&format!("IncomingPhoneNumbers/{}", sid));
        Ok(self.get(&url, None).await?)
    }

    async fn update_phone_number(
        &self,
        sid: &str,
        params: &Params,
    ) -> ApiResult<IncomingPhoneNumber> {
        let url = self.account_url(&format!("IncomingPhoneNumbers/{}", sid));
        Ok(self.post(&url, params).await?)
    }

    async fn release_phone_number(&self, sid: &str) -> ApiResult<()> {
        let url = self.account_url(&format!("IncomingPhoneNumbers/{}", sid));
        Ok(self.delete(&url).await?)
    }

    async fn list_phone_numbers(&self, filter: &Params) -> ApiResult<Page<IncomingPhoneNumber>> {
        let url = self.account_url("IncomingPhoneNumbers");
        let page: IncomingNumbersPage = self.get(&url, Some(&Self::listing_filter(filter))).await?;
        Ok(Page {
            items: page.incoming_phone_numbers,
            next_page_uri: page.next_page_uri,
        })
    }

    async fn create_messaging_service(&self, params: &Params) -> ApiResult<MessagingService> {
        Ok(self.post(&self.services_url(""), params).await?)
    }

    async fn get_messaging_service(&self, sid: &str) -> ApiResult<MessagingService> {
        Ok(self.get(&self.services_url(sid), None).await?)
    }

    async fn update_messaging_service(
        &self,
        sid: &str,
        params: &Params,
    ) -> ApiResult<MessagingService> {
        Ok(self.post(&self.services_url(sid), params).await?)
    }

    async fn delete_messaging_service(&self, sid: &str) -> ApiResult<()> {
        Ok(self.delete(&self.services_url(sid)).await?)
    }

    async fn list_messaging_services(&self, filter: &Params) -> ApiResult<Page<MessagingService>> {
        let page: ServicesPage = self
            .get(&self.services_url(""), Some(&Self::listing_filter(filter)))
            .await?;
        Ok(Page {
            items: page.services,
            next_page_uri: page.meta.next_page_url,
        })
    }

    async fn add_service_phone_number(
        &self,
        service_sid: &str,
        phone_number_sid: &str,
    ) -> ApiResult<()> {
        let url = self.services_url(&format!("{}/PhoneNumbers", service_sid));
        let form: Params = [("PhoneNumberSid", phone_number_sid)].into_iter().collect();
        Ok(self.post_discard(&url, &form).await?)
    }

    async fn remove_service_phone_number(
        &self,
        service_sid: &str,
        phone_number_sid: &str,
    ) -> ApiResult<()> {
        let url = self.services_url(&format!("{}/PhoneNumbers/{}", service_sid, phone_number_sid));
        Ok(self.delete(&url).await?)
    }

    async fn create_account(&self, params: &Params) -> ApiResult<Account> {
        Ok(self.post(&self.accounts_url(None), params).await?)
    }

    async fn get_account(&self, sid: &str) -> ApiResult<Account> {
        Ok(self.get(&self.accounts_url(Some(sid)), None).await?)
    }

    async fn update_account(&self, sid: &str, params: &Params) -> ApiResult<Account> {
        Ok(self.post(&self.accounts_url(Some(sid)), params).await?)
    }

    async fn list_accounts(&self, filter: &Params) -> ApiResult<Page<Account>> {
        let page: AccountsPage = self
            .get(&self.accounts_url(None), Some(&Self::listing_filter(filter)))
            .await?;
        Ok(Page {
            items: page.accounts,
            next_page_uri: page.next_page_uri,
        })
    }

    async fn create_key(&self, params: &Params) -> ApiResult<ApiKey> {
        Ok(self.post(&self.account_url("Keys"), params).await?)
    }

    async fn get_key(&self, sid: &str) -> ApiResult<ApiKey> {
        Ok(self.get(&self.account_url(&format!("Keys/{}", sid)), None).await?)
    }

    async fn delete_key(&self, sid: &str) -> ApiResult<()> {
        Ok(self.delete(&self.account_url(&format!("Keys/{}", sid))).await?)
    }
}
