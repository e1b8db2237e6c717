//! Message-count collectors. Each counts rows of `messages` sent inside
//! the half-open window `[:window_start, :window_end)`.

use tally_core::traits::collector::CollectorQuery;
use tally_core::types::rows::RowLevel;

/// Per sender, subgroup `"true"`/`"false"` for bot senders.
pub const SENT_BY_SENDER_TYPE: CollectorQuery = CollectorQuery {
    name: "messages_sent_by_sender_type",
    output_level: RowLevel::User,
    sql: "
        INSERT INTO user_counts (user_id, tenant_id, property, subgroup, end_time, value)
        SELECT u.id, u.tenant_id, :property,
               CASE u.is_bot WHEN 1 THEN 'true' ELSE 'false' END,
               :window_end, COUNT(*)
        FROM messages m
        JOIN users u ON u.id = m.sender_id
        WHERE m.sent_at >= :window_start AND m.sent_at < :window_end
        GROUP BY u.id, u.tenant_id, u.is_bot",
};

/// Per sender, subgroup is the recipient kind.
pub const SENT_BY_RECIPIENT_KIND: CollectorQuery = CollectorQuery {
    name: "messages_sent_by_recipient_kind",
    output_level: RowLevel::User,
    sql: "
        INSERT INTO user_counts (user_id, tenant_id, property, subgroup, end_time, value)
        SELECT u.id, u.tenant_id, :property, m.recipient_kind, :window_end, COUNT(*)
        FROM messages m
        JOIN users u ON u.id = m.sender_id
        WHERE m.sent_at >= :window_start AND m.sent_at < :window_end
        GROUP BY u.id, u.tenant_id, m.recipient_kind",
};

/// Per sender, subgroup is the sending client's name.
pub const SENT_BY_CLIENT: CollectorQuery = CollectorQuery {
    name: "messages_sent_by_client",
    output_level: RowLevel::User,
    sql: "
        INSERT INTO user_counts (user_id, tenant_id, property, subgroup, end_time, value)
        SELECT u.id, u.tenant_id, :property, m.client, :window_end, COUNT(*)
        FROM messages m
        JOIN users u ON u.id = m.sender_id
        WHERE m.sent_at >= :window_start AND m.sent_at < :window_end
        GROUP BY u.id, u.tenant_id, m.client",
};

/// Per channel, subgroup is whether the sender is a bot. Direct messages
/// have no channel and are not counted.
pub const IN_CHANNEL_BY_SENDER_TYPE: CollectorQuery = CollectorQuery {
    name: "messages_in_channel_by_sender_type",
    output_level: RowLevel::Channel,
    sql: "
        INSERT INTO channel_counts (channel_id, tenant_id, property, subgroup, end_time, value)
        SELECT c.id, c.tenant_id, :property,
               CASE u.is_bot WHEN 1 THEN 'true' ELSE 'false' END,
               :window_end, COUNT(*)
        FROM messages m
        JOIN channels c ON c.id = m.channel_id
        JOIN users u ON u.id = m.sender_id
        WHERE m.recipient_kind = 'channel'
          AND m.sent_at >= :window_start AND m.sent_at < :window_end
        GROUP BY c.id, c.tenant_id, u.is_bot",
};
