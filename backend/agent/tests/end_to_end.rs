use std::sync::Arc;

use async_trait::async_trait;

use studybuddy_agent::{Activation, ActivationSettings, SendOutcome, ELISION_MARKER, PREAMBLE};
use studybuddy_browser::{ExtractionLimits, PageAgent, PageDocument};
use studybuddy_core::{
    ConversationStore, ExtractedPage, PageContentOutcome, PageContentProvider, PageRequest, Turn,
};
use studybuddy_memory::{InMemoryStore, SqliteStore};
use studybuddy_providers::ScriptedEndpoint;

struct StaticPage(ExtractedPage);

#[async_trait]
impl PageContentProvider for StaticPage {
    async fn request(&self, _request: PageRequest) -> PageContentOutcome {
        PageContentOutcome::Delivered(self.0.clone())
    }
}

fn photosynthesis_page() -> ExtractedPage {
    let content: String = (0..9000)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect();
    ExtractedPage {
        locator: "https://biology.example.edu/photosynthesis".into(),
        title: "Photosynthesis 101".into(),
        raw_text: content,
        selection_text: String::new(),
        questions: vec![],
    }
}

#[tokio::test]
async fn follow_up_question_gets_full_context() {
    let store = Arc::new(InMemoryStore::new());
    store
        .append(Turn::new(
            "What is photosynthesis?",
            "It turns light into chemical energy.",
            "Photosynthesis 101",
        ))
        .await
        .unwrap();
    store
        .append(Turn::new(
            "Where does it happen?",
            "In the chloroplasts.",
            "Photosynthesis 101",
        ))
        .await
        .unwrap();

    let endpoint = Arc::new(ScriptedEndpoint::new("mock").with_response("Respiration reverses it."));
    let page = photosynthesis_page();
    let activation = Activation::start(
        store.clone(),
        &StaticPage(page.clone()),
        endpoint.clone(),
        ActivationSettings::default(),
    )
    .await;

    let question = "How does this relate to respiration?";
    let outcome = activation.send(question).await;
    assert_eq!(outcome, SendOutcome::Replied("Respiration reverses it.".into()));

    let prompts = endpoint.prompts().await;
    // Two short turns never trigger summarization.
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];

    assert!(prompt.starts_with(PREAMBLE));
    assert!(prompt.contains("User: What is photosynthesis?\nAssistant: It turns light into chemical energy."));
    assert!(prompt.contains("User: Where does it happen?\nAssistant: In the chloroplasts."));
    assert!(prompt.contains("Photosynthesis 101"));

    let block = format!(
        "{}{}{}",
        &page.raw_text[..4800],
        ELISION_MARKER,
        &page.raw_text[9000 - 3200..]
    );
    assert!(prompt.contains(&block));
    assert!(prompt.ends_with(question));

    assert_eq!(store.query("Photosynthesis 101").await.unwrap().len(), 3);
}

#[tokio::test]
async fn html_page_through_agent_and_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("history.db")).unwrap());

    let article = "Mitochondria produce most of the cell's supply of ATP. ".repeat(8);
    let html = format!(
        "<html><head><title>Cell Energy</title></head><body><nav>Home | About</nav>\
         <article><h1>Cell Energy</h1><p>{article}</p><p>Why do muscle cells need so many mitochondria?</p></article>\
         <footer>Copyright</footer></body></html>"
    );
    let document = PageDocument::parse("https://biology.example.edu/energy", &html);
    let handle = PageAgent::new(document, ExtractionLimits::default()).spawn();

    let endpoint = Arc::new(ScriptedEndpoint::new("mock").with_response("They burn a lot of ATP."));
    let activation = Activation::start(store.clone(), &handle, endpoint.clone(), ActivationSettings::default()).await;

    let page = activation.page().unwrap();
    assert_eq!(page.title, "Cell Energy");
    assert_eq!(page.questions, vec!["Why do muscle cells need so many mitochondria?"]);
    assert!(!page.raw_text.contains("Copyright"));

    let outcome = activation.ask_about(&page.questions[0]).await;
    assert_eq!(outcome, SendOutcome::Replied("They burn a lot of ATP.".into()));

    let prompt = &endpoint.prompts().await[0];
    assert!(prompt.contains("I'm looking at a webpage titled \"Cell Energy\"."));
    assert!(prompt.ends_with("My question: Help me understand: Why do muscle cells need so many mitochondria?"));
    assert_eq!(store.query("Cell Energy").await.unwrap().len(), 1);
}
