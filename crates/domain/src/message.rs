// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Text of the messages sent to employees.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::types::Employee;

/// Default text of the reachability probe.
pub const DEFAULT_PROBE_MESSAGE: &str = "We are looking for your lunch partner...";

const SINGULAR_PREFIX: &str = "Hello! Your next random lunch partner is here: ";
const PLURAL_PREFIX: &str = "Hello! Your next random lunch partners are here: ";

/// Placeholder replaced by the external directory id in profile URL templates.
pub const PROFILE_ID_PLACEHOLDER: &str = "{id}";

/// How the chat provider should render a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MessageFormat {
    /// Rendered verbatim.
    #[default]
    Plain,
    /// Rendered as (legacy) Markdown.
    Markdown,
}

impl MessageFormat {
    /// The provider's `parse_mode` value, if any.
    #[must_use]
    pub const fn parse_mode(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Markdown => Some("Markdown"),
        }
    }
}

/// Escapes Markdown metacharacters so `text` renders literally.
///
/// Only valid outside an entity: legacy Markdown ignores backslashes inside
/// link labels and URLs.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut escaped: String = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Makes `text` usable as the label of a Markdown link.
///
/// Other metacharacters are literal inside a label; only brackets would end
/// it, so they become parentheses.
#[must_use]
pub fn markdown_link_label(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '[' => '(',
            ']' => ')',
            other => other,
        })
        .collect()
}

/// Makes `url` usable as the target of a Markdown link.
///
/// Parentheses and whitespace are percent-encoded so the target cannot end early.
#[must_use]
pub fn markdown_link_target(url: &str) -> String {
    let mut target: String = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '(' => target.push_str("%28"),
            ')' => target.push_str("%29"),
            c if c.is_whitespace() => {
                let mut buf: [u8; 4] = [0; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    target.push_str(&format!("%{byte:02X}"));
                }
            }
            c => target.push(c),
        }
    }
    target
}

/// Expands a profile URL template for the given external id.
///
/// Returns `None` when the template has no `{id}` placeholder or the id is blank.
#[must_use]
pub fn profile_url(template: &str, external_id: &str) -> Option<String> {
    let external_id: &str = external_id.trim();
    if external_id.is_empty() || !template.contains(PROFILE_ID_PLACEHOLDER) {
        return None;
    }
    Some(template.replace(PROFILE_ID_PLACEHOLDER, external_id))
}

/// Renders one partner as a Markdown fragment.
///
/// The display name links to the partner's chat; an empty display name falls
/// back to the chat id, then to the employee id.
#[must_use]
pub fn partner_card(partner: &Employee, profile_url_template: Option<&str>) -> String {
    let name: String = partner.display_name();
    let label: String = if !name.is_empty() {
        name
    } else if let Some(chat) = &partner.chat {
        chat.chat_id.to_string()
    } else {
        partner.employee_id.to_string()
    };

    let mut card: String = match &partner.chat {
        Some(chat) => format!(
            "[{}]({})",
            markdown_link_label(&label),
            markdown_link_target(&chat.deep_link())
        ),
        None => escape_markdown(&label),
    };

    let profile: Option<String> = profile_url_template
        .zip(partner.directory.external_id.as_deref())
        .and_then(|(template, id)| profile_url(template, id));
    if let Some(url) = profile {
        card.push_str(&format!(" ([profile]({}))", markdown_link_target(&url)));
    }

    if let Some(username) = partner
        .username
        .as_deref()
        .map(|u| u.trim().trim_start_matches('@'))
        .filter(|u| !u.is_empty())
    {
        card.push_str(&format!(" (@{})", escape_markdown(username)));
    }

    card
}

/// Composes the announcement sent to one member about their partners.
///
/// One partner uses the singular form; several are comma-joined under the
/// plural form. Partners are listed in the order given.
///
/// # Errors
///
/// Returns [`DomainError::NoPartners`] if `partners` is empty.
pub fn compose_partner_announcement(
    partners: &[Employee],
    profile_url_template: Option<&str>,
) -> Result<String, DomainError> {
    match partners {
        [] => Err(DomainError::NoPartners),
        [partner] => Ok(format!(
            "{SINGULAR_PREFIX}{}",
            partner_card(partner, profile_url_template)
        )),
        _ => {
            let cards: Vec<String> = partners
                .iter()
                .map(|partner| partner_card(partner, profile_url_template))
                .collect();
            Ok(format!("{PLURAL_PREFIX}{}", cards.join(", ")))
        }
    }
}
