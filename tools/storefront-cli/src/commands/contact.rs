//! Contact request commands.

use anyhow::Result;
use storefront_commerce::contact::{ContactForm, ContactStatus};
use storefront_commerce::ContactRequestId;

use super::{ContactArgs, ContactCommand};
use crate::context::Context;
use crate::output::{format_timestamp, status_badge, truncate};

/// Run the contact command.
pub async fn run(args: ContactArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ContactCommand::Submit {
            name,
            phone,
            message,
            email,
            company,
            equipment,
        } => {
            let mut form = ContactForm::new(name, phone, message);
            if let Some(email) = email {
                form = form.with_email(email);
            }
            if let Some(company) = company {
                form = form.with_company(company);
            }
            if let Some(equipment) = equipment {
                form = form.with_equipment(equipment);
            }
            submit(form, ctx).await
        }
        ContactCommand::List { limit } => list(limit, ctx).await,
        ContactCommand::Status { id, status } => set_status(&id, &status, ctx).await,
    }
}

async fn submit(form: ContactForm, ctx: &Context) -> Result<()> {
    let receipt = ctx
        .storefront()
        .await?
        .submit_contact_request(form)
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&receipt);
        return Ok(());
    }
    ctx.output
        .success(&format!("Contact request {} received", receipt.id));
    Ok(())
}

async fn list(limit: Option<i64>, ctx: &Context) -> Result<()> {
    let requests = ctx
        .storefront()
        .await?
        .list_contact_requests(limit)
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&requests);
        return Ok(());
    }

    ctx.output.header("Contact requests");
    if requests.is_empty() {
        ctx.output.info("No contact requests.");
        return Ok(());
    }

    let widths = [36, 20, 12, 20, 18, 30];
    ctx.output.table_header(
        &["ID", "RECEIVED", "STATUS", "NAME", "PHONE", "MESSAGE"],
        &widths,
    );
    for request in &requests {
        ctx.output.table_row(
            &[
                request.id.as_str(),
                &format_timestamp(request.created_at),
                &status_badge(request.status.as_str(), widths[2]),
                &truncate(&request.name, widths[3]),
                &request.phone,
                &truncate(&request.message, widths[5]),
            ],
            &widths,
        );
    }
    Ok(())
}

async fn set_status(id: &str, status: &str, ctx: &Context) -> Result<()> {
    let target: ContactStatus = status.parse()?;
    let updated = ctx
        .storefront()
        .await?
        .set_contact_status(&ContactRequestId::new(id.trim()), target)
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&updated);
        return Ok(());
    }
    ctx.output.success(&format!(
        "Contact request {} is now {}",
        updated.id,
        updated.status.display_name()
    ));
    Ok(())
}
