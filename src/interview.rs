use crate::library::{BookApiClient, BookList, BookLookup, BookRecord, CharacterList};
use crate::state::PersonalizationProfile;
use anyhow::{bail, Result};
use inquire::{Confirm, CustomType, Select, Text};
use log::warn;

/// Interactive book selection: list, pick, then enrich with the detail
/// record and character list when the service can provide them.
pub async fn select_book(client: &BookApiClient) -> Result<BookRecord> {
    let category = Text::new("Filter by category (leave empty for all):")
        .with_help_message("e.g. Fantasy, Fiction, Adventure")
        .prompt()?;
    let category = category.trim();
    let category = (!category.is_empty()).then_some(category);

    let books = match client.list_books(category).await {
        BookList::Listed(books) => books,
        BookList::ServiceError(msg) => bail!("Book service unavailable: {}", msg),
    };
    if books.is_empty() {
        bail!("No books available in the library");
    }

    let options: Vec<String> = books
        .iter()
        .map(|b| {
            format!(
                "{} — {} ({})",
                b.title,
                b.author.as_deref().unwrap_or("Unknown"),
                b.genre.as_deref().unwrap_or("Unclassified")
            )
        })
        .collect();

    let choice = Select::new("Select a book:", options).raw_prompt()?;
    let listed = books.into_iter().nth(choice.index).unwrap();

    // The listing entry is already usable; the detail record just has more
    // to quote from, so lookup failures only cost detail.
    let book = match client.get_book(&listed.id_string()).await {
        BookLookup::Found(detail) => detail,
        BookLookup::NotFound => {
            warn!("Book {} has no detail record, using listing entry", listed.id_string());
            listed
        }
        BookLookup::ServiceError(msg) => {
            warn!("{}", msg);
            listed
        }
    };

    if let Some(overview) = &book.overview {
        println!("\n{}\n", overview);
    }
    if let CharacterList::Listed(characters) = client.get_characters(&book.id_string()).await {
        let names: Vec<&str> = characters
            .iter()
            .filter_map(|c| c.get("name").and_then(|n| n.as_str()))
            .collect();
        if !names.is_empty() {
            println!("Characters: {}\n", names.join(", "));
        }
    }

    Ok(book)
}

/// The personalization interview. The returned profile is immutable; rerun
/// the interview to change anything.
pub fn run_interview(book_id: Option<String>) -> Result<PersonalizationProfile> {
    let audience = Select::new(
        "Who is this story for?",
        vec!["Child 5-8", "Child 9-12", "Teen", "Adult", "Myself"],
    )
    .prompt()?
    .to_string();

    let tone = Select::new(
        "What mood should the story have?",
        vec!["Whimsical", "Serious", "Funny", "Dark", "Cozy"],
    )
    .prompt()?
    .to_string();

    let length = Select::new(
        "How long should it be?",
        vec!["Short (2-3 pages)", "Medium (5-7 pages)", "Full"],
    )
    .prompt()?
    .to_string();

    let originality = CustomType::<f32>::new("How faithful to the original? (0 = adapted, 1 = faithful)")
        .with_error_message("Please enter a number between 0 and 1")
        .prompt()?;

    let adaptations_raw = Text::new("Special adaptation requests (comma separated, empty for none):")
        .prompt()?;

    let profile = PersonalizationProfile {
        audience,
        tone,
        length,
        originality_score: clamp_score(originality),
        special_adaptations: parse_adaptations(&adaptations_raw),
        book_id,
    };

    println!(
        "\nProfile: {} / {} / {} / originality {:.2}",
        profile.audience, profile.tone, profile.length, profile.originality_score
    );
    if !profile.special_adaptations.is_empty() {
        println!("Adaptations: {}", profile.special_adaptations.join("; "));
    }

    let confirmed = Confirm::new("Generate the story with this profile?")
        .with_default(true)
        .prompt()?;
    if !confirmed {
        bail!("Interview cancelled");
    }

    Ok(profile)
}

fn clamp_score(score: f32) -> f32 {
    score.clamp(0.0, 1.0)
}

fn parse_adaptations(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
