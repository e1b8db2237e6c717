//! The built-in statistic catalog and the collector statements behind it.

pub mod activity;
pub mod messages;

use std::sync::Arc;

use tally_core::types::rows::{RowLevel, UndoScope};
use tally_core::types::time::{Frequency, Interval};

use crate::registry::StatDefinition;

pub const MESSAGES_SENT_BY_BOT_HOUR: &str = "messages_sent:is_bot:hour";
pub const MESSAGES_SENT_BY_TYPE_DAY: &str = "messages_sent:message_type:day";
pub const MESSAGES_SENT_BY_CLIENT_DAY: &str = "messages_sent:client:day";
pub const MESSAGES_IN_CHANNEL_DAY: &str = "messages_in_channel:is_bot:day";
pub const ACTIVE_USERS_AUDIT_DAY: &str = "active_users_audit:is_bot:day";
pub const ONE_DAY_ACTIVES: &str = "1day_actives::day";
pub const SEVEN_DAY_ACTIVES: &str = "7day_actives::day";
pub const FIFTEEN_DAY_ACTIVES: &str = "15day_actives::day";
pub const ACTIVE_HUMANS_DAY: &str = "active_humans::day";
pub const MESSAGES_READ_HOUR: &str = "messages_read::hour";
pub const ACTIVE_USERS_LOG_DAY: &str = "active_users_log:is_bot:day";
pub const INVITES_SENT_DAY: &str = "invites_sent::day";

/// The standard catalog, in scheduling order.
pub fn builtin_definitions() -> Vec<StatDefinition> {
    vec![
        StatDefinition::computed(
            MESSAGES_SENT_BY_BOT_HOUR,
            Frequency::Hour,
            Arc::new(messages::SENT_BY_SENDER_TYPE),
        ),
        StatDefinition::computed(
            MESSAGES_SENT_BY_TYPE_DAY,
            Frequency::Day,
            Arc::new(messages::SENT_BY_RECIPIENT_KIND),
        ),
        StatDefinition::computed(
            MESSAGES_SENT_BY_CLIENT_DAY,
            Frequency::Day,
            Arc::new(messages::SENT_BY_CLIENT),
        ),
        StatDefinition::computed(
            MESSAGES_IN_CHANNEL_DAY,
            Frequency::Day,
            Arc::new(messages::IN_CHANNEL_BY_SENDER_TYPE),
        ),
        StatDefinition::computed(
            ACTIVE_USERS_AUDIT_DAY,
            Frequency::Day,
            Arc::new(activity::AUDIT_ACTIVE_USERS),
        )
        .with_interval(Interval::Unbounded),
        StatDefinition::computed(ONE_DAY_ACTIVES, Frequency::Day, Arc::new(activity::ACTIVE_IN_WINDOW)),
        StatDefinition::computed(
            SEVEN_DAY_ACTIVES,
            Frequency::Day,
            Arc::new(activity::ACTIVE_IN_WINDOW),
        )
        .with_interval(Interval::days(7)),
        StatDefinition::computed(
            FIFTEEN_DAY_ACTIVES,
            Frequency::Day,
            Arc::new(activity::ACTIVE_IN_WINDOW),
        )
        .with_interval(Interval::days(15)),
        StatDefinition::computed(
            ACTIVE_HUMANS_DAY,
            Frequency::Day,
            Arc::new(activity::ACTIVE_HUMANS),
        )
        .depends_on(ACTIVE_USERS_AUDIT_DAY)
        .depends_on(FIFTEEN_DAY_ACTIVES),
        StatDefinition::logging(
            MESSAGES_READ_HOUR,
            Frequency::Hour,
            RowLevel::User,
            UndoScope::above(RowLevel::User),
        ),
        StatDefinition::logging(
            ACTIVE_USERS_LOG_DAY,
            Frequency::Day,
            RowLevel::Tenant,
            UndoScope::above(RowLevel::Tenant),
        ),
        StatDefinition::logging(
            INVITES_SENT_DAY,
            Frequency::Day,
            RowLevel::Tenant,
            UndoScope::above(RowLevel::Tenant),
        ),
    ]
}
