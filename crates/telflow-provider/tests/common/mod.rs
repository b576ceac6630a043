use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use telflow_provider::client::{
    Account, ApiKey, AvailableNumber, IncomingPhoneNumber, MessagingService,
};
use telflow_provider::{
    ApiError, ApiResult, LifecycleController, Page, Params, ProviderClient, ProviderConfig,
    ProviderContext, ResourceData, ResourceKind, SelectionPolicy,
};

/// One remote request as seen by the fake
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Call {
    SearchLocal { country_code: String, filter: Params },
    CreatePhoneNumber(Params),
    GetPhoneNumber(String),
    UpdatePhoneNumber(String, Params),
    ReleasePhoneNumber(String),
    ListPhoneNumbers(Params),
    CreateService(Params),
    GetService(String),
    UpdateService(String, Params),
    DeleteService(String),
    ListServices(Params),
    Attach { service_sid: String, phone_number_sid: String },
    Detach { service_sid: String, phone_number_sid: String },
    CreateAccount(Params),
    GetAccount(String),
    UpdateAccount(String, Params),
    ListAccounts(Params),
    CreateKey(Params),
    GetKey(String),
    DeleteKey(String),
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    available: Vec<AvailableNumber>,
    phone_numbers: Vec<IncomingPhoneNumber>,
    services: Vec<MessagingService>,
    accounts: Vec<Account>,
    keys: Vec<ApiKey>,
    /// One-shot failures keyed by operation name
    failures: HashMap<&'static str, ApiError>,
}

impl FakeState {
    fn next_sid(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{:032}", prefix, self.next_id)
    }
}

/// In-memory provider API that records every request
#[derive(Default)]
pub struct FakeClient {
    calls: Mutex<Vec<Call>>,
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make the next call of `operation` fail with `err`
    pub fn fail_next(&self, operation: &'static str, err: ApiError) {
        self.state.lock().unwrap().failures.insert(operation, err);
    }

    pub fn offer_numbers(&self, numbers: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.available = numbers
            .iter()
            .map(|n| AvailableNumber {
                phone_number: n.to_string(),
                ..Default::default()
            })
            .collect();
    }

    pub fn add_phone_number(&self, sid: &str, phone_number: &str, friendly_name: &str) {
        self.state.lock().unwrap().phone_numbers.push(IncomingPhoneNumber {
            sid: sid.to_string(),
            phone_number: phone_number.to_string(),
            friendly_name: friendly_name.to_string(),
            ..Default::default()
        });
    }

    pub fn add_service(&self, sid: &str, friendly_name: &str) {
        self.state.lock().unwrap().services.push(MessagingService {
            sid: sid.to_string(),
            friendly_name: friendly_name.to_string(),
            ..Default::default()
        });
    }

    pub fn add_account(&self, sid: &str, friendly_name: &str) {
        self.state.lock().unwrap().accounts.push(Account {
            sid: sid.to_string(),
            owner_account_sid: "ACparent".to_string(),
            friendly_name: friendly_name.to_string(),
            status: "active".to_string(),
            ..Default::default()
        });
    }

    pub fn remove_phone_number(&self, sid: &str) {
        self.state
            .lock()
            .unwrap()
            .phone_numbers
            .retain(|n| n.sid != sid);
    }

    pub fn account(&self, sid: &str) -> Option<Account> {
        self.state
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.sid == sid)
            .cloned()
    }

    fn record(&self, operation: &'static str, call: Call) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.state.lock().unwrap().failures.remove(operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn apply_phone_params(number: &mut IncomingPhoneNumber, params: &Params) {
    for (key, value) in params.iter() {
        let value = Some(value.to_string());
        match key {
            "FriendlyName" => number.friendly_name = value.unwrap_or_default(),
            "SmsUrl" => number.sms_url = value,
            "SmsMethod" => number.sms_method = value,
            "VoiceUrl" => number.voice_url = value,
            "VoiceMethod" => number.voice_method = value,
            "EmergencyStatus" => number.emergency_status = value,
            _ => {}
        }
    }
}

fn not_found(what: &str, sid: &str) -> ApiError {
    ApiError::not_found(format!("The requested resource {} {} was not found", what, sid))
        .with_code(20404)
}

#[async_trait]
impl ProviderClient for FakeClient {
    async fn search_local_numbers(
        &self,
        country_code: &str,
        filter: &Params,
    ) -> ApiResult<Vec<AvailableNumber>> {
        self.record(
            "search_local_numbers",
            Call::SearchLocal {
                country_code: country_code.to_string(),
                filter: filter.clone(),
            },
        )?;
        Ok(self.state.lock().unwrap().available.clone())
    }

    async fn create_phone_number(&self, params: &Params) -> ApiResult<IncomingPhoneNumber> {
        self.record("create_phone_number", Call::CreatePhoneNumber(params.clone()))?;
        let mut state = self.state.lock().unwrap();
        let phone_number = params.get("PhoneNumber").unwrap_or_default().to_string();
        let mut number = IncomingPhoneNumber {
            sid: state.next_sid("PN"),
            account_sid: "ACtest".to_string(),
            friendly_name: phone_number.clone(),
            phone_number,
            date_created: Some("Tue, 31 Aug 2010 20:36:28 +0000".to_string()),
            date_updated: Some("Tue, 31 Aug 2010 20:36:44 +0000".to_string()),
            ..Default::default()
        };
        apply_phone_params(&mut number, params);
        state.phone_numbers.push(number.clone());
        Ok(number)
    }

    async fn get_phone_number(&self, sid: &str) -> ApiResult<IncomingPhoneNumber> {
        self.record("get_phone_number", Call::GetPhoneNumber(sid.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .phone_numbers
            .iter()
            .find(|n| n.sid == sid)
            .cloned()
            .ok_or_else(|| not_found("IncomingPhoneNumber", sid))
    }

    async fn update_phone_number(
        &self,
        sid: &str,
        params: &Params,
    ) -> ApiResult<IncomingPhoneNumber> {
        self.record(
            "update_phone_number",
            Call::UpdatePhoneNumber(sid.to_string(), params.clone()),
        )?;
        let mut state = self.state.lock().unwrap();
        let number = state
            .phone_numbers
            .iter_mut()
            .find(|n| n.sid == sid)
            .ok_or_else(|| not_found("IncomingPhoneNumber", sid))?;
        apply_phone_params(number, params);
        Ok(number.clone())
    }

    async fn release_phone_number(&self, sid: &str) -> ApiResult<()> {
        self.record("release_phone_number", Call::ReleasePhoneNumber(sid.to_string()))?;
        let mut state = self.state.lock().unwrap();
        let before = state.phone_numbers.len();
        state.phone_numbers.retain(|n| n.sid != sid);
        if state.phone_numbers.len() == before {
            return Err(not_found("IncomingPhoneNumber", sid));
        }
        Ok(())
    }

    async fn list_phone_numbers(&self, filter: &Params) -> ApiResult<Page<IncomingPhoneNumber>> {
        self.record("list_phone_numbers", Call::ListPhoneNumbers(filter.clone()))?;
        Ok(Page::new(self.state.lock().unwrap().phone_numbers.clone()))
    }

    async fn create_messaging_service(&self, params: &Params) -> ApiResult<MessagingService> {
        self.record("create_messaging_service", Call::CreateService(params.clone()))?;
        let mut state = self.state.lock().unwrap();
        let service = MessagingService {
            sid: state.next_sid("MG"),
            account_sid: "ACtest".to_string(),
            friendly_name: params.get("FriendlyName").unwrap_or_default().to_string(),
            inbound_request_url: params.get("InboundRequestUrl").map(str::to_string),
            sticky_sender: params.get("StickySender").map(|v| v == "true"),
            date_created: Some("2015-07-30T20:12:31Z".to_string()),
            ..Default::default()
        };
        state.services.push(service.clone());
        Ok(service)
    }

    async fn get_messaging_service(&self, sid: &str) -> ApiResult<MessagingService> {
        self.record("get_messaging_service", Call::GetService(sid.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .services
            .iter()
            .find(|s| s.sid == sid)
            .cloned()
            .ok_or_else(|| not_found("Service", sid))
    }

    async fn update_messaging_service(
        &self,
        sid: &str,
        params: &Params,
    ) -> ApiResult<MessagingService> {
        self.record(
            "update_messaging_service",
            Call::UpdateService(sid.to_string(), params.clone()),
        )?;
        let mut state = self.state.lock().unwrap();
        let service = state
            .services
            .iter_mut()
            .find(|s| s.sid == sid)
            .ok_or_else(|| not_found("Service", sid))?;
        if let Some(name) = params.get("FriendlyName") {
            service.friendly_name = name.to_string();
        }
        Ok(service.clone())
    }

    async fn delete_messaging_service(&self, sid: &str) -> ApiResult<()> {
        self.record("delete_messaging_service", Call::DeleteService(sid.to_string()))?;
        self.state.lock().unwrap().services.retain(|s| s.sid != sid);
        Ok(())
    }

    async fn list_messaging_services(&self, filter: &Params) -> ApiResult<Page<MessagingService>> {
        self.record("list_messaging_services", Call::ListServices(filter.clone()))?;
        Ok(Page::new(self.state.lock().unwrap().services.clone()))
    }

    async fn add_service_phone_number(
        &self,
        service_sid: &str,
        phone_number_sid: &str,
    ) -> ApiResult<()> {
        self.record(
            "attach",
            Call::Attach {
                service_sid: service_sid.to_string(),
                phone_number_sid: phone_number_sid.to_string(),
            },
        )
    }

    async fn remove_service_phone_number(
        &self,
        service_sid: &str,
        phone_number_sid: &str,
    ) -> ApiResult<()> {
        self.record(
            "detach",
            Call::Detach {
                service_sid: service_sid.to_string(),
                phone_number_sid: phone_number_sid.to_string(),
            },
        )
    }

    async fn create_account(&self, params: &Params) -> ApiResult<Account> {
        self.record("create_account", Call::CreateAccount(params.clone()))?;
        let mut state = self.state.lock().unwrap();
        let account = Account {
            sid: state.next_sid("AC"),
            owner_account_sid: "ACparent".to_string(),
            friendly_name: params.get("FriendlyName").unwrap_or_default().to_string(),
            status: "active".to_string(),
            auth_token: Some("token-from-create".to_string()),
            date_created: Some("Tue, 31 Aug 2010 20:36:28 +0000".to_string()),
            date_updated: Some("Tue, 31 Aug 2010 20:36:28 +0000".to_string()),
        };
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn get_account(&self, sid: &str) -> ApiResult<Account> {
        self.record("get_account", Call::GetAccount(sid.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .accounts
            .iter()
            .find(|a| a.sid == sid)
            .cloned()
            .ok_or_else(|| not_found("Account", sid))
    }

    async fn update_account(&self, sid: &str, params: &Params) -> ApiResult<Account> {
        self.record(
            "update_account",
            Call::UpdateAccount(sid.to_string(), params.clone()),
        )?;
        let mut state = self.state.lock().unwrap();
        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.sid == sid)
            .ok_or_else(|| not_found("Account", sid))?;
        if let Some(status) = params.get("Status") {
            account.status = status.to_string();
        }
        Ok(account.clone())
    }

    async fn list_accounts(&self, filter: &Params) -> ApiResult<Page<Account>> {
        self.record("list_accounts", Call::ListAccounts(filter.clone()))?;
        Ok(Page::new(self.state.lock().unwrap().accounts.clone()))
    }

    async fn create_key(&self, params: &Params) -> ApiResult<ApiKey> {
        self.record("create_key", Call::CreateKey(params.clone()))?;
        let mut state = self.state.lock().unwrap();
        let sid = state.next_sid("SK");
        let key = ApiKey {
            friendly_name: params
                .get("FriendlyName")
                .map(str::to_string)
                .unwrap_or_else(|| sid.clone()),
            sid,
            secret: Some("key-secret".to_string()),
            date_created: Some("Tue, 31 Aug 2010 20:36:28 +0000".to_string()),
            date_updated: None,
        };
        state.keys.push(ApiKey {
            secret: None,
            ..key.clone()
        });
        Ok(key)
    }

    async fn get_key(&self, sid: &str) -> ApiResult<ApiKey> {
        self.record("get_key", Call::GetKey(sid.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .keys
            .iter()
            .find(|k| k.sid == sid)
            .cloned()
            .ok_or_else(|| not_found("Key", sid))
    }

    async fn delete_key(&self, sid: &str) -> ApiResult<()> {
        self.record("delete_key", Call::DeleteKey(sid.to_string()))?;
        self.state.lock().unwrap().keys.retain(|k| k.sid != sid);
        Ok(())
    }
}

#[allow(dead_code)]
pub fn context(client: Arc<FakeClient>) -> ProviderContext {
    context_with_policy(client, SelectionPolicy::TakeFirst)
}

#[allow(dead_code)]
pub fn context_with_policy(client: Arc<FakeClient>, policy: SelectionPolicy) -> ProviderContext {
    let config = ProviderConfig::new("ACtest", "test-token").with_selection_policy(policy);
    ProviderContext::new(client, config)
}

#[allow(dead_code)]
pub fn controller(client: &Arc<FakeClient>) -> LifecycleController {
    LifecycleController::new(context(client.clone()))
}

/// Record built from operator input
#[allow(dead_code)]
pub fn declared(kind: ResourceKind, value: Value) -> ResourceData {
    let map: Map<String, Value> = value.as_object().cloned().unwrap();
    ResourceData::from_config(kind, map).unwrap()
}

/// Record of a tracked resource with a pending change
#[allow(dead_code)]
pub fn planned(kind: ResourceKind, prior: &ResourceData, value: Value) -> ResourceData {
    use telflow_provider::ConfigStore;
    let map: Map<String, Value> = value.as_object().cloned().unwrap();
    ResourceData::planned(
        kind,
        prior.id().unwrap(),
        prior.attributes().clone(),
        map,
    )
    .unwrap()
}
