//! Social agent: voice-matched post drafts and hashtag suggestions.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{Display, VariantNames};

use super::{prompt_date, registry, service_tool, Domain};
use crate::config::ArtistProfile;
use crate::error::MuseError;
use crate::tools::{AgentToolParameters, ToolRegistry};

pub const AGENT_NAME: &str = "SocialAgent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PostType {
    Feed,
    Reel,
    Story,
    Carousel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Posted,
    Archived,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoiceCategory {
    GigPromo,
    BehindTheScenes,
    FanEngagement,
    NewRelease,
    Personal,
    Collaboration,
    Milestone,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceQuery {
    pub query: String,
    #[serde(default = "default_voice_results")]
    pub n_results: u32,
    #[serde(default)]
    pub category: Option<VoiceCategory>,
}

/// Input of `create_post_draft`. A missing platform is filled from the
/// artist profile before the service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub caption: String,
    pub post_type: PostType,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub image_description: String,
    #[serde(default)]
    pub voice_category: Option<VoiceCategory>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostFilter {
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default = "default_post_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRef {
    pub post_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub post_id: String,
    pub updates: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSample {
    pub text: String,
    #[serde(default)]
    pub category: VoiceCategory,
    #[serde(default = "default_sample_source")]
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoInput {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagRequest {
    pub topic: String,
    #[serde(default = "default_hashtag_count")]
    pub count: usize,
}

fn default_voice_results() -> u32 {
    3
}

fn default_post_limit() -> u32 {
    20
}

fn default_sample_source() -> String {
    "manual".to_string()
}

fn default_hashtag_count() -> usize {
    15
}

/// Topic keyword to hashtags, checked in order.
const HASHTAG_LIBRARY: &[(&str, &[&str])] = &[
    ("indie", &["#indiemusic", "#indieartist", "#indierock", "#indiefolk", "#indiepop", "#independentartist", "#supportindiemusic"]),
    ("rock", &["#rockmusic", "#liverock", "#rockband", "#alternativerock", "#rocknroll"]),
    ("hip hop", &["#hiphop", "#hiphopmusic", "#rapper", "#hiphopculture", "#rapmusic"]),
    ("r&b", &["#rnb", "#rnbmusic", "#rnbsinger", "#rnbsoul", "#rnbvibes"]),
    ("jazz", &["#jazz", "#jazzmusic", "#jazzmusician", "#livejazz", "#jazzclub"]),
    ("country", &["#countrymusic", "#countrysinger", "#countryartist", "#nashville"]),
    ("electronic", &["#electronicmusic", "#edm", "#producer", "#synth", "#dancemusic"]),
    ("soul", &["#soulmusic", "#soul", "#soulful", "#neosoul"]),
    ("pop", &["#popmusic", "#popsinger", "#popartist", "#dreampop"]),
    ("folk", &["#folkmusic", "#folkartist", "#acoustic", "#singersongwriter"]),
    ("gig", &["#liveshow", "#giglife", "#liveset", "#concert", "#liveperformance", "#showtime"]),
    ("studio", &["#studiolife", "#recording", "#recordingstudio", "#mixing", "#newmusic"]),
    ("release", &["#newsingle", "#newrelease", "#outnow", "#presave", "#newmusicalert", "#linkinbio"]),
    ("behind the scenes", &["#bts", "#behindthescenes", "#behindthemusic", "#makingmusic"]),
    ("collaboration", &["#collab", "#collaboration", "#musiccollab"]),
];

const GENERAL_HASHTAGS: &[&str] = &[
    "#newmusic",
    "#livemusic",
    "#musician",
    "#musiclife",
    "#originalmusic",
    "#singersongwriter",
    "#supportlocalmusic",
    "#independentmusician",
];

/// Topic-matched hashtags followed by general music tags, deduplicated and
/// cut to `count`.
pub fn suggest_hashtags(topic: &str, count: usize) -> Vec<String> {
    let topic = topic.to_lowercase();
    let matched = HASHTAG_LIBRARY
        .iter()
        .filter(|(keyword, _)| topic.contains(keyword))
        .flat_map(|(_, tags)| tags.iter());

    let mut seen = HashSet::new();
    matched
        .chain(GENERAL_HASHTAGS.iter())
        .filter(|tag| seen.insert(**tag))
        .take(count)
        .map(|tag| tag.to_string())
        .collect()
}

/// Post storage and the artist's voice sample store.
#[async_trait]
pub trait SocialService: Send + Sync {
    /// Past captions closest to `query`, used to match the artist's voice.
    async fn get_voice_context(&self, query: VoiceQuery) -> Result<Value, MuseError>;
    async fn create_post_draft(&self, draft: PostDraft) -> Result<Value, MuseError>;
    async fn list_posts(&self, filter: PostFilter) -> Result<Value, MuseError>;
    async fn get_post(&self, post: PostRef) -> Result<Value, MuseError>;
    async fn update_post(&self, update: PostUpdate) -> Result<Value, MuseError>;
    /// Archives rather than deletes.
    async fn delete_post(&self, post: PostRef) -> Result<Value, MuseError>;
    async fn add_voice_sample(&self, sample: VoiceSample) -> Result<Value, MuseError>;
    async fn list_voice_samples(&self) -> Result<Value, MuseError>;

    async fn generate_hashtags(&self, request: HashtagRequest) -> Result<Value, MuseError> {
        let hashtags = suggest_hashtags(&request.topic, request.count);
        Ok(json!({
            "topic": request.topic,
            "count": hashtags.len(),
            "hashtags": hashtags,
        }))
    }
}

pub fn persona_prompt(profile: &ArtistProfile, today: NaiveDate) -> String {
    format!(
        "You are the Social Agent for Muse, the assistant that runs the business side of {artist}'s music career.

You draft posts in the artist's own voice, manage drafts and suggest hashtags. Posts are copied and published by hand; you never post.

Rules:
1. Before writing a caption, call get_voice_context with the post's topic and match the tone, slang, emoji and length of what comes back.
2. Offer two or three caption options. Gig promos name the venue, date, time and ticket info.
3. Save the chosen caption with create_post_draft. The default platform is {platform}.
4. Good examples the artist shares go into add_voice_sample so the voice keeps improving.
5. Deleting a post archives it.

Today is {today}. Keep it brief.",
        artist = profile.artist_name,
        platform = profile.social_platform,
        today = prompt_date(today),
    )
}

pub fn tools(service: Option<Arc<dyn SocialService>>) -> Result<ToolRegistry, MuseError> {
    tools_with_platform(service, ArtistProfile::default().social_platform)
}

/// Tools whose `create_post_draft` falls back to `default_platform`.
pub fn tools_with_platform(
    service: Option<Arc<dyn SocialService>>,
    default_platform: String,
) -> Result<ToolRegistry, MuseError> {
    let domain = Domain::Social;
    let default_platform = Arc::new(default_platform);

    registry(vec![
        service_tool(
            &service,
            domain,
            "get_voice_context",
            "Find the artist's past captions closest to a topic. Call before drafting.",
            AgentToolParameters::object()
                .string("query", "What the post is about", true)
                .integer("n_results", "How many samples. Default: 3", false)
                .string_enum("category", "Only this kind of sample", VoiceCategory::VARIANTS, false)
                .build(),
            |svc: Arc<dyn SocialService>, input: VoiceQuery| async move { svc.get_voice_context(input).await },
        ),
        service_tool(
            &service,
            domain,
            "create_post_draft",
            "Save a caption as a draft post.",
            AgentToolParameters::object()
                .string("caption", "Caption text", true)
                .string_enum("post_type", "Kind of post", PostType::VARIANTS, true)
                .string("platform", "Platform. Defaults to the artist's platform", false)
                .string_array("hashtags", "Hashtags including '#'", false)
                .string("image_description", "What the image or video shows", false)
                .string_enum("voice_category", "Voice category of the caption", VoiceCategory::VARIANTS, false)
                .string("notes", "Private notes", false)
                .build(),
            move |svc: Arc<dyn SocialService>, mut input: PostDraft| {
                let default_platform = Arc::clone(&default_platform);
                async move {
                    if input.platform.as_deref().map_or(true, str::is_empty) {
                        input.platform = Some(default_platform.as_ref().clone());
                    }
                    svc.create_post_draft(input).await
                }
            },
        ),
        service_tool(
            &service,
            domain,
            "list_posts",
            "List posts, newest first.",
            AgentToolParameters::object()
                .string_enum("status", "Only this status", PostStatus::VARIANTS, false)
                .string("platform", "Only this platform", false)
                .integer("limit", "Maximum posts. Default: 20", false)
                .build(),
            |svc: Arc<dyn SocialService>, input: PostFilter| async move { svc.list_posts(input).await },
        ),
        service_tool(
            &service,
            domain,
            "get_post",
            "Full details of one post.",
            AgentToolParameters::object()
                .string("post_id", "Post id", true)
                .build(),
            |svc: Arc<dyn SocialService>, input: PostRef| async move { svc.get_post(input).await },
        ),
        service_tool(
            &service,
            domain,
            "update_post",
            "Change a post's caption, hashtags, status, schedule or notes.",
            AgentToolParameters::object()
                .string("post_id", "Post id", true)
                .object("updates", "Fields to change", true)
                .build(),
            |svc: Arc<dyn SocialService>, input: PostUpdate| async move { svc.update_post(input).await },
        ),
        service_tool(
            &service,
            domain,
            "delete_post",
            "Archive a post.",
            AgentToolParameters::object()
                .string("post_id", "Post id", true)
                .build(),
            |svc: Arc<dyn SocialService>, input: PostRef| async move { svc.delete_post(input).await },
        ),
        service_tool(
            &service,
            domain,
            "add_voice_sample",
            "Store a caption the artist wrote as a voice example.",
            AgentToolParameters::object()
                .string("text", "Caption text", true)
                .string_enum("category", "Kind of sample. Default: other", VoiceCategory::VARIANTS, false)
                .string("source", "Where it came from. Default: manual", false)
                .build(),
            |svc: Arc<dyn SocialService>, input: VoiceSample| async move { svc.add_voice_sample(input).await },
        ),
        service_tool(
            &service,
            domain,
            "list_voice_samples",
            "List every stored voice sample.",
            AgentToolParameters::empty(),
            |svc: Arc<dyn SocialService>, _input: NoInput| async move { svc.list_voice_samples().await },
        ),
        service_tool(
            &service,
            domain,
            "generate_hashtags",
            "Suggest hashtags for a topic, e.g. 'indie rock gig'.",
            AgentToolParameters::object()
                .string("topic", "Topic or genre", true)
                .integer("count", "How many. Default: 15", false)
                .build(),
            |svc: Arc<dyn SocialService>, input: HashtagRequest| async move {
                svc.generate_hashtags(input).await
            },
        ),
    ])
}
