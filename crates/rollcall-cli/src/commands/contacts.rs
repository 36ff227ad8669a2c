use crate::commands::{print_json, Context, DEFAULT_HISTORY_LIMIT};
use crate::error::{invalid_input, not_found};
use crate::util::{format_millis_datetime, parse_phone};
use anyhow::Result;
use clap::Args;
use rollcall_core::domain::CanonicalPhone;
use rollcall_core::dto::{CommunicationDto, ContactListItemDto};

#[derive(Debug, Args)]
pub struct ListArgs {}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub phone: String,
    #[arg(long)]
    pub limit: Option<i64>,
}

pub fn list_contacts(ctx: &Context<'_>, _args: ListArgs) -> Result<()> {
    let items: Vec<ContactListItemDto> = ctx
        .store
        .contacts()
        .list_all()?
        .iter()
        .map(ContactListItemDto::from)
        .collect();

    if ctx.json {
        return print_json(&items);
    }

    if items.is_empty() {
        println!("no contacts");
        return Ok(());
    }

    let rules = &ctx.config.phone;
    for item in items {
        let phone = CanonicalPhone::parse(&item.phone)
            .map(|phone| rules.format_for_display(&phone))
            .unwrap_or(item.phone);
        println!(
            "{}  {}  [{}]  {} msgs  {}",
            phone, item.display_name, item.tier, item.message_count, item.sources
        );
    }
    Ok(())
}

pub fn show_history(ctx: &Context<'_>, args: HistoryArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit <= 0 {
        return Err(invalid_input("limit must be positive"));
    }

    let phone = parse_phone(&args.phone, &ctx.config.phone)?;
    let contact = ctx
        .store
        .contacts()
        .get_by_phone(&phone)?
        .ok_or_else(|| not_found(format!("no contact with phone {phone}")))?;

    let items: Vec<CommunicationDto> = ctx
        .store
        .communications()
        .list_for_contact(&contact.id, limit)?
        .into_iter()
        .map(|item| CommunicationDto {
            occurred_at: item.occurred_at,
            direction: item.direction.as_str().to_string(),
            message: item.message,
            readable_date: item.readable_date,
        })
        .collect();

    if ctx.json {
        return print_json(&items);
    }

    println!("{}  {}", contact.display_name, phone);
    if items.is_empty() {
        println!("no messages");
        return Ok(());
    }
    for item in items {
        let arrow = if item.direction == "received" { "<-" } else { "->" };
        println!(
            "{}  {}  {}",
            format_millis_datetime(item.occurred_at),
            arrow,
            item.message
        );
    }
    Ok(())
}
