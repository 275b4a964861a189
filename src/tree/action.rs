//! Actions exposed by a route node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tree::node::MiddlewareEntry;

/// HTTP verbs a registered route answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Map a transport-level method. Methods outside the action verbs yield `None`.
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        match *method {
            axum::http::Method::GET => Some(HttpMethod::Get),
            axum::http::Method::HEAD => Some(HttpMethod::Head),
            axum::http::Method::POST => Some(HttpMethod::Post),
            axum::http::Method::PUT => Some(HttpMethod::Put),
            axum::http::Method::PATCH => Some(HttpMethod::Patch),
            axum::http::Method::DELETE => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// GET-like methods are the only ones eligible for locale redirects.
    pub fn is_get_like(self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of action names a node may expose.
///
/// The name selects the HTTP verbs and, for `create` and `edit`, a path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionName {
    Index,
    Create,
    Store,
    Show,
    Edit,
    Update,
    Destroy,
    Get,
    Post,
}

impl ActionName {
    pub const ALL: [ActionName; 9] = [
        ActionName::Index,
        ActionName::Create,
        ActionName::Store,
        ActionName::Show,
        ActionName::Edit,
        ActionName::Update,
        ActionName::Destroy,
        ActionName::Get,
        ActionName::Post,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionName::Index => "index",
            ActionName::Create => "create",
            ActionName::Store => "store",
            ActionName::Show => "show",
            ActionName::Edit => "edit",
            ActionName::Update => "update",
            ActionName::Destroy => "destroy",
            ActionName::Get => "get",
            ActionName::Post => "post",
        }
    }

    /// Static verb mapping for each action.
    pub fn methods(self) -> &'static [HttpMethod] {
        match self {
            ActionName::Index
            | ActionName::Create
            | ActionName::Show
            | ActionName::Edit
            | ActionName::Get => &[HttpMethod::Get, HttpMethod::Head],
            ActionName::Store | ActionName::Post => &[HttpMethod::Post],
            ActionName::Update => &[HttpMethod::Put, HttpMethod::Patch],
            ActionName::Destroy => &[HttpMethod::Delete],
        }
    }

    /// `get` is the node's implicit action; its route name carries no action part.
    pub fn is_implicit_default(self) -> bool {
        self == ActionName::Get
    }

    pub fn is_get(self) -> bool {
        self.methods().contains(&HttpMethod::Get)
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

/// How an action is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Controller reference.
    Uses,
    /// Named view.
    View,
    /// Named closure registered with the dispatcher.
    Closure,
    /// Redirect to another node id or an absolute path.
    Redirect,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Uses => "uses",
            ActionKind::View => "view",
            ActionKind::Closure => "closure",
            ActionKind::Redirect => "redirect",
        }
    }
}

/// One HTTP-exposable behavior on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAction {
    pub name: ActionName,
    pub kind: ActionKind,
    pub value: String,
    /// Action-level middleware, merged last.
    pub middleware: Vec<(String, MiddlewareEntry)>,
    /// Status used by redirect actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_status: Option<u16>,
}

impl RouteAction {
    pub fn new(name: ActionName, kind: ActionKind, value: impl Into<String>) -> Self {
        Self {
            name,
            kind,
            value: value.into(),
            middleware: Vec::new(),
            redirect_status: None,
        }
    }
}
