// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{create_test_employee, with_username};
use crate::{
    DirectoryLinkage, DomainError, Employee, MessageFormat, compose_partner_announcement,
    escape_markdown, markdown_link_label, markdown_link_target, profile_url,
};

#[test]
fn test_singular_announcement_links_partner_chat() {
    let partner: Employee = create_test_employee(2, "Ada", "Lovelace");
    let text: String = compose_partner_announcement(&[partner], None).unwrap();
    assert_eq!(
        text,
        "Hello! Your next random lunch partner is here: [Ada Lovelace](tg://user?id=1002)"
    );
}

#[test]
fn test_plural_announcement_joins_partners_with_commas() {
    let first: Employee = create_test_employee(2, "Ada", "Lovelace");
    let second: Employee = create_test_employee(3, "Alan", "Turing");
    let text: String = compose_partner_announcement(&[first, second], None).unwrap();
    assert_eq!(
        text,
        "Hello! Your next random lunch partners are here: \
         [Ada Lovelace](tg://user?id=1002), [Alan Turing](tg://user?id=1003)"
    );
}

#[test]
fn test_announcement_without_partners_is_an_error() {
    assert_eq!(
        compose_partner_announcement(&[], None),
        Err(DomainError::NoPartners)
    );
}

#[test]
fn test_nameless_partner_is_shown_by_chat_id() {
    let partner: Employee = create_test_employee(2, "  ", "");
    let text: String = compose_partner_announcement(&[partner.clone(), partner], None).unwrap();
    assert!(text.contains("[1002](tg://user?id=1002)"));
}

#[test]
fn test_directory_name_and_profile_link_are_used() {
    let mut partner: Employee = create_test_employee(2, "ada", "l");
    partner.directory = DirectoryLinkage {
        external_id: Some(String::from("77")),
        first_name: Some(String::from("Ada")),
        last_name: Some(String::from("Lovelace")),
    };
    let partner: Employee = with_username(partner, "@ada_l");

    let text: String =
        compose_partner_announcement(&[partner], Some("https://hr.example.com/people/{id}"))
            .unwrap();
    assert_eq!(
        text,
        "Hello! Your next random lunch partner is here: [Ada Lovelace](tg://user?id=1002) \
         ([profile](https://hr.example.com/people/77)) (@ada\\_l)"
    );
}

#[test]
fn test_profile_link_needs_template_placeholder_and_id() {
    assert_eq!(profile_url("https://hr.example.com/", "77"), None);
    assert_eq!(profile_url("https://hr.example.com/{id}", " "), None);
    assert_eq!(
        profile_url("https://hr.example.com/{id}", "77"),
        Some(String::from("https://hr.example.com/77"))
    );
}

#[test]
fn test_partner_without_chat_is_named_without_link() {
    let mut partner: Employee = create_test_employee(2, "Ada", "Lovelace");
    partner.chat = None;
    let text: String = compose_partner_announcement(&[partner], None).unwrap();
    assert_eq!(text, "Hello! Your next random lunch partner is here: Ada Lovelace");
}

#[test]
fn test_markdown_metacharacters_are_escaped() {
    assert_eq!(escape_markdown("a_b*c`d[e]"), "a\\_b\\*c\\`d\\[e]");
}

#[test]
fn test_linked_name_keeps_underscores_literal() {
    let partner: Employee = create_test_employee(2, "Ada_Byron", "[Lovelace]");
    let text: String = compose_partner_announcement(&[partner], None).unwrap();
    assert_eq!(
        text,
        "Hello! Your next random lunch partner is here: [Ada_Byron (Lovelace)](tg://user?id=1002)"
    );
}

#[test]
fn test_unlinked_name_is_escaped() {
    let mut partner: Employee = create_test_employee(2, "Ada_Byron", "*Lovelace*");
    partner.chat = None;
    let text: String = compose_partner_announcement(&[partner], None).unwrap();
    assert_eq!(
        text,
        "Hello! Your next random lunch partner is here: Ada\\_Byron \\*Lovelace\\*"
    );
}

#[test]
fn test_profile_link_target_is_encoded() {
    let mut partner: Employee = create_test_employee(2, "Ada", "Lovelace");
    partner.directory.external_id = Some(String::from("a)b c"));
    let text: String =
        compose_partner_announcement(&[partner], Some("https://hr.example.com/people/{id}"))
            .unwrap();
    assert!(text.ends_with(" ([profile](https://hr.example.com/people/a%29b%20c))"));
}

#[test]
fn test_link_helpers() {
    assert_eq!(markdown_link_label("a_b [c]"), "a_b (c)");
    assert_eq!(markdown_link_target("https://x/(y) z"), "https://x/%28y%29%20z");
}

#[test]
fn test_message_format_parse_mode() {
    assert_eq!(MessageFormat::Markdown.parse_mode(), Some("Markdown"));
    assert_eq!(MessageFormat::Plain.parse_mode(), None);
}
