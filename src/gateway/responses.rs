//! Typed records narrowed out of admin API XML documents.
//!
//! Every decoder checks the root element name first, so an error document
//! or an unexpected resource never gets silently read as an empty result.

use super::xml::{collection, XmlNode};
use super::GatewayError;

/// Gateway account, identified by a string-encoded numeric id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// `None` when the document carried no usable id
    pub id: Option<String>,
}

/// Keyed credential under an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: String,
    pub name: String,
    /// Secret key (`user_key`); absent for non key-based auth modes
    pub user_key: Option<String>,
    pub plan_id: Option<String>,
}

/// Application plan bound to a backend service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: String,
    pub name: Option<String>,
    pub service_id: Option<String>,
}

/// Named, visibility-flagged capability on a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub id: Option<String>,
    pub name: String,
    pub system_name: Option<String>,
    pub visible: bool,
}

/// Proxy configuration of a backend service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProxy {
    pub service_id: Option<String>,
    /// Public base URL in front of the service
    pub endpoint: Option<String>,
    pub sandbox_endpoint: Option<String>,
}

fn expect_root<'a>(
    operation: &'static str,
    root: &'a XmlNode,
    expected: &str,
) -> Result<&'a XmlNode, GatewayError> {
    if root.name == expected {
        Ok(root)
    } else {
        Err(GatewayError::malformed(
            operation,
            format!("expected <{expected}> document, got <{}>", root.name),
        ))
    }
}

/// Optional wrapper variant: a blank body is an empty collection
fn expect_wrapper<'a>(
    operation: &'static str,
    root: Option<&'a XmlNode>,
    expected: &str,
) -> Result<Option<&'a XmlNode>, GatewayError> {
    root.map(|r| expect_root(operation, r, expected)).transpose()
}

fn required(operation: &'static str, node: &XmlNode, field: &str) -> Result<String, GatewayError> {
    node.child_string(field).ok_or_else(|| {
        GatewayError::malformed(operation, format!("<{}> without <{field}>", node.name))
    })
}

/// `accounts/find.xml`: the account id sits directly under `<account>`
pub fn decode_found_account(
    operation: &'static str,
    root: &XmlNode,
) -> Result<Account, GatewayError> {
    let account = expect_root(operation, root, "account")?;
    Ok(Account {
        id: account.child_string("id"),
    })
}

/// `signup.xml`: the id is read from the account's user list
///
/// With several users the first one wins; with one user the wrapper holds a
/// single object. Both shapes go through the same normalization.
pub fn decode_signup_account(
    operation: &'static str,
    root: &XmlNode,
) -> Result<Account, GatewayError> {
    let account = expect_root(operation, root, "account")?;
    let id = collection(account.child("users"), "user")
        .first()
        .and_then(|user| user.child_string("account_id"));
    Ok(Account { id })
}

fn decode_application_node(
    operation: &'static str,
    node: &XmlNode,
) -> Result<Application, GatewayError> {
    Ok(Application {
        id: required(operation, node, "id")?,
        name: required(operation, node, "name")?,
        user_key: node.child_string("user_key"),
        plan_id: node
            .child_string("plan_id")
            .or_else(|| node.child("plan").and_then(|p| p.child_string("id"))),
    })
}

pub fn decode_applications(
    operation: &'static str,
    root: Option<&XmlNode>,
) -> Result<Vec<Application>, GatewayError> {
    let wrapper = expect_wrapper(operation, root, "applications")?;
    collection(wrapper, "application")
        .into_iter()
        .map(|node| decode_application_node(operation, node))
        .collect()
}

pub fn decode_application(
    operation: &'static str,
    root: &XmlNode,
) -> Result<Application, GatewayError> {
    let node = expect_root(operation, root, "application")?;
    decode_application_node(operation, node)
}

pub fn decode_plans(
    operation: &'static str,
    root: Option<&XmlNode>,
) -> Result<Vec<Plan>, GatewayError> {
    let wrapper = expect_wrapper(operation, root, "plans")?;
    collection(wrapper, "plan")
        .into_iter()
        .map(|node| {
            Ok(Plan {
                id: required(operation, node, "id")?,
                name: node.child_string("name"),
                service_id: node.child_string("service_id"),
            })
        })
        .collect()
}

pub fn decode_features(
    operation: &'static str,
    root: Option<&XmlNode>,
) -> Result<Vec<Feature>, GatewayError> {
    let wrapper = expect_wrapper(operation, root, "features")?;
    Ok(collection(wrapper, "feature")
        .into_iter()
        .map(|node| Feature {
            id: node.child_string("id"),
            name: node.child_string("name").unwrap_or_default(),
            system_name: node.child_string("system_name"),
            visible: node
                .child_text("visible")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        })
        .collect())
}

pub fn decode_service_proxy(
    operation: &'static str,
    root: &XmlNode,
) -> Result<ServiceProxy, GatewayError> {
    let proxy = expect_root(operation, root, "proxy")?;
    Ok(ServiceProxy {
        service_id: proxy.child_string("service_id"),
        endpoint: proxy.child_string("endpoint"),
        sandbox_endpoint: proxy.child_string("sandbox_endpoint"),
    })
}
