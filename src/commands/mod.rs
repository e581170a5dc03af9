// One-shot command mode: run a single repository operation and exit.
use anyhow::{Context as AnyhowContext, Result};
use url::Url;

use crate::app::App;
use crate::cli::Command;
use crate::import::HttpSource;
use crate::repository::{ImportError, MutationError};
use crate::store::Contact;

pub async fn run(app: &App, cmd: &Command) -> Result<()> {
    match cmd {
        Command::List { query, favorites } => {
            app.repository.list().context("loading contacts")?;
            if let Some(query) = query {
                app.repository.set_query(query.clone());
            }
            app.repository.set_favorites_only(*favorites);
            let contacts = app.repository.visible();
            if contacts.is_empty() {
                println!("no contacts");
            }
            for contact in &contacts {
                print_contact(contact);
            }
        }
        Command::Add { name, phone, email } => {
            finish_mutation(app.repository.add(name, phone.as_deref(), email.as_deref()))?;
            println!("added {}", name.trim());
        }
        Command::Edit {
            id,
            name,
            phone,
            email,
        } => {
            finish_mutation(app.repository.update(
                *id,
                name,
                phone.as_deref(),
                email.as_deref(),
            ))?;
            println!("updated contact {id}");
        }
        Command::Rm { id } => {
            finish_mutation(app.repository.delete(*id))?;
            println!("removed contact {id}");
        }
        Command::Fav { id } => {
            let Some(contact) = app.repository.find(*id) else {
                anyhow::bail!("no contact with id {id}");
            };
            finish_mutation(app.repository.toggle_favorite(&contact))?;
            if contact.favorite {
                println!("contact {id} is no longer a favorite");
            } else {
                println!("contact {id} is now a favorite");
            }
        }
        Command::Import { url } => {
            let result = match url {
                Some(raw) => {
                    let url = Url::parse(raw)
                        .with_context(|| format!("invalid import url: {raw}"))?;
                    app.repository.import(&HttpSource::new(url)).await
                }
                None => app.repository.import(app.source.as_ref()).await,
            };
            let imported = match result {
                Ok(imported) => imported,
                Err(ImportError::Refresh { inserted, source }) => {
                    log::warn!("Imported {inserted} contacts, but reloading failed: {source}");
                    inserted
                }
                Err(err) => return Err(err.into()),
            };
            println!("imported {imported} contacts");
        }
    }
    Ok(())
}

/// A reload failure after a successful write is reported, not fatal.
fn finish_mutation(result: std::result::Result<(), MutationError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(MutationError::Refresh(err)) => {
            log::warn!("Change saved, but reloading contacts failed: {err}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_contact(contact: &Contact) {
    let star = if contact.favorite { "★" } else { " " };
    println!(
        "{:>4} {} {}  {}  {}",
        contact.id,
        star,
        contact.name,
        contact.phone.as_deref().unwrap_or("-"),
        contact.email.as_deref().unwrap_or("-"),
    );
}
