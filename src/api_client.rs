use {
    crate::{
        config::ApiSettings,
        errors::{Error, Result},
        quota_checker::AccountQuota,
    },
    json::JsonValue,
    reqwest::{header, StatusCode},
};

/// Read-only view of the hosted e-mail service.
pub trait AccountApi {
    fn list_accounts(&self, domain: &str) -> Result<Vec<String>>;
    fn get_quota(&self, account: &str) -> Result<AccountQuota>;
}

pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    user: String,
    key: String,
}

impl ApiClient {
    pub fn new(cfg: &ApiSettings) -> ApiClient {
        return ApiClient {
            http: reqwest::blocking::Client::new(),
            base_url: cfg.url.clone(),
            user: cfg.user.clone(),
            key: cfg.key.clone(),
        };
    }

    fn request(&self, target: &str, field: &str, value: &str) -> Result<(String, JsonValue)> {
        let url = format!("{}{}", self.base_url, target);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.key))
            .header(header::ACCEPT, "application/json")
            .form(&[(field, value)])
            .send()
            .map_err(|source| Error::ApiTransport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::ApiAuthentication {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(|source| Error::ApiTransport {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(Error::ApiRejected {
                url,
                code: status.as_u16(),
                text: body,
            });
        }
        let parsed = parse_response(&url, &body)?;
        return Ok((url, parsed));
    }
}

impl AccountApi for ApiClient {
    fn list_accounts(&self, domain: &str) -> Result<Vec<String>> {
        let (url, parsed) = self.request("list", "domainname", domain)?;
        return account_list(&url, &parsed);
    }

    fn get_quota(&self, account: &str) -> Result<AccountQuota> {
        let (url, parsed) = self.request("quota", "emailaccount", account)?;
        return account_quota(&url, &parsed);
    }
}

/// Parses the body and checks the status block the API embeds in every answer.
fn parse_response(url: &str, body: &str) -> Result<JsonValue> {
    let parsed = json::parse(body).map_err(|err| Error::MalformedResponse {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    let status = &parsed["response"]["status"];
    if let Some(code) = status["code"].as_u16() {
        if code == 401 || code == 403 {
            return Err(Error::ApiAuthentication {
                url: url.to_string(),
                status: code,
            });
        }
        if code != 200 {
            return Err(Error::ApiRejected {
                url: url.to_string(),
                code,
                text: status["text"].as_str().unwrap_or_default().to_string(),
            });
        }
    }
    return Ok(parsed);
}

fn account_list(url: &str, parsed: &JsonValue) -> Result<Vec<String>> {
    let accounts = &parsed["response"]["list"]["emailaccounts"];
    if !accounts.is_array() {
        return Err(malformed(url, "response.list.emailaccounts is not a list"));
    }
    let mut res = Vec::with_capacity(accounts.len());
    for account in accounts.members() {
        match account["emailaccount"].as_str() {
            Some(address) => res.push(address.to_string()),
            None => return Err(malformed(url, "account entry without emailaccount")),
        }
    }
    return Ok(res);
}

fn account_quota(url: &str, parsed: &JsonValue) -> Result<AccountQuota> {
    let quota = &parsed["response"]["quota"];
    let used = number(&quota["used"]["amount"])
        .ok_or_else(|| malformed(url, "response.quota.used.amount is not a byte count"))?;
    let max = number(&quota["total"]["max"])
        .ok_or_else(|| malformed(url, "response.quota.total.max is not a byte count"))?;
    return Ok(AccountQuota { used, max });
}

/// Finite, non-negative number, given as JSON number or numeric string.
fn number(value: &JsonValue) -> Option<f64> {
    return value
        .as_f64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .filter(|n: &f64| n.is_finite() && *n >= 0.0);
}

fn malformed(url: &str, reason: &str) -> Error {
    return Error::MalformedResponse {
        url: url.to_string(),
        reason: reason.to_string(),
    };
}
