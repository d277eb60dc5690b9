//! Hybrid category resolution
//!
//! Every shop name resolves to a valid taxonomy pair, always:
//! 1. Static pass: ordered substring scan of the configured shop rules.
//!    Deterministic, zero I/O.
//! 2. Fallback pass on miss: one constrained classification call against the
//!    gateway, with the taxonomy enumerated as a closed option set.
//! 3. Strict reply validation, defaulting to the fallback category on any
//!    malformed or unavailable answer.
//!
//! Classification failure is never an error to the caller: a record that
//! cannot be classified is still submitted, tagged with the fallback
//! category, so no transaction is silently dropped.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::GatewaySettings;
use crate::gateway::{ClassifyBackend, CompletionOptions, GatewayClient};
use crate::models::ResolvedCategory;
use crate::taxonomy::{ShopCategoryMap, Taxonomy, OTHER_CATEGORY_ID};

/// Resolves shop names to (category, genre) pairs
pub struct CategoryResolver {
    taxonomy: Taxonomy,
    shop_map: ShopCategoryMap,
    gateway: Option<GatewayClient>,
    options: CompletionOptions,
    min_call_interval: Duration,
    /// Serializes gateway calls and spaces them out (provider rate limit)
    last_call: Mutex<Option<Instant>>,
}

impl CategoryResolver {
    pub fn new(
        taxonomy: Taxonomy,
        shop_map: ShopCategoryMap,
        gateway: Option<GatewayClient>,
        settings: &GatewaySettings,
    ) -> Self {
        Self {
            taxonomy,
            shop_map,
            gateway,
            options: CompletionOptions {
                temperature: 0.0,
                max_output_tokens: settings.max_output_tokens,
            },
            min_call_interval: settings.min_call_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Resolve a shop name to a valid taxonomy pair
    ///
    /// Total: always returns a member of the taxonomy, degrading to the
    /// fallback category when neither pass can do better.
    pub async fn resolve(&self, shop: &str) -> ResolvedCategory {
        if let Some(hit) = self.shop_map.lookup(&self.taxonomy, shop) {
            debug!(shop, category_id = hit.category_id, "static map hit");
            return hit;
        }

        info!(shop, "shop not in static map, asking gateway");
        let prompt = self.build_prompt(shop);
        match self.complete_throttled(&prompt).await {
            Some(reply) => {
                debug!(shop, reply = %reply, "gateway reply");
                self.validate_reply(shop, &reply)
            }
            None => {
                warn!(shop, "classification unavailable, defaulting");
                self.taxonomy.other()
            }
        }
    }

    /// Build the single-turn classification prompt
    ///
    /// Enumerates every (genreId, "categoryName-genreName") pair as the
    /// closed option set and pins the reply to one of three shapes:
    /// `categoryId,genreId`, `categoryId,0`, or `199,0`.
    fn build_prompt(&self, shop: &str) -> String {
        let options = self
            .taxonomy
            .genre_options()
            .into_iter()
            .map(|(id, name)| format!("{}:{}", id, name))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "店名「{shop}」の家計簿上の適切なカテゴリを、次の選択肢から1つだけ選んでください。\n\
             回答は「カテゴリID,ジャンルID」の形式で、数値のみを返してください。\n\
             ジャンルまで判断できない場合は「カテゴリID,0」、\
             該当するカテゴリがない場合は「{other},0」と回答してください。\n\
             選択肢: [{options}]",
            shop = shop,
            other = OTHER_CATEGORY_ID,
            options = options,
        )
    }

    /// Call the gateway, serialized and spaced by the minimum interval
    async fn complete_throttled(&self, prompt: &str) -> Option<String> {
        let gateway = self.gateway.as_ref()?;

        // The lock is held across the call so fallback calls never overlap
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_call_interval {
                tokio::time::sleep(self.min_call_interval - elapsed).await;
            }
        }
        let reply = gateway.complete(prompt, &self.options).await;
        *last = Some(Instant::now());
        reply
    }

    /// Strict two-stage decode of a gateway reply
    ///
    /// Parse exactly two comma-separated integers, then validate both
    /// against the taxonomy. Every malformed or out-of-taxonomy branch lands
    /// on a safe default; a gateway answer is never trusted as-is.
    fn validate_reply(&self, shop: &str, reply: &str) -> ResolvedCategory {
        let mut parts = reply.trim().split(',');
        let ids = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => a
                .trim()
                .parse::<i64>()
                .ok()
                .zip(b.trim().parse::<i64>().ok()),
            _ => None,
        };

        let Some((category_id, genre_id)) = ids else {
            warn!(shop, reply = %reply, "malformed gateway reply, defaulting");
            return self.taxonomy.other();
        };

        if category_id == OTHER_CATEGORY_ID {
            info!(shop, "gateway could not classify");
            return self.taxonomy.other();
        }

        let Some(category) = self.taxonomy.category(category_id) else {
            warn!(shop, category_id, "gateway answered an unknown category");
            return self.taxonomy.other();
        };

        let genre_id = if genre_id != 0 && category.genres.iter().any(|g| g.id == genre_id) {
            genre_id
        } else {
            // Genre unresolved (0) or not one of this category's genres
            match self.taxonomy.default_genre(category_id) {
                Some(id) => id,
                None => return self.taxonomy.other(),
            }
        };

        ResolvedCategory {
            category_id,
            genre_id,
        }
    }
}
