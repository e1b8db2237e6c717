//! Active-user collectors over the audit log and activity intervals.

use tally_core::traits::collector::CollectorQuery;
use tally_core::types::rows::RowLevel;

/// One row per user whose latest audit event before `:window_end` is
/// `created` or `reactivated`. Ties on time go to the later log entry.
pub const AUDIT_ACTIVE_USERS: CollectorQuery = CollectorQuery {
    name: "audit_active_users",
    output_level: RowLevel::User,
    sql: "
        INSERT INTO user_counts (user_id, tenant_id, property, subgroup, end_time, value)
        SELECT u.id, u.tenant_id, :property,
               CASE u.is_bot WHEN 1 THEN 'true' ELSE 'false' END,
               :window_end, 1
        FROM user_audit_log a
        JOIN users u ON u.id = a.user_id
        WHERE a.event_time >= :window_start
          AND a.event_time < :window_end
          AND a.event_type IN ('created', 'reactivated')
          AND NOT EXISTS (
              SELECT 1 FROM user_audit_log later
              WHERE later.user_id = a.user_id
                AND later.event_time < :window_end
                AND (later.event_time > a.event_time
                     OR (later.event_time = a.event_time AND later.id > a.id))
          )",
};

/// One row per user with an activity interval overlapping the window.
/// Shared by the 1, 7, and 15 day statistics; only the interval differs.
pub const ACTIVE_IN_WINDOW: CollectorQuery = CollectorQuery {
    name: "active_in_window",
    output_level: RowLevel::User,
    sql: "
        INSERT INTO user_counts (user_id, tenant_id, property, subgroup, end_time, value)
        SELECT u.id, u.tenant_id, :property, NULL, :window_end, 1
        FROM users u
        WHERE EXISTS (
            SELECT 1 FROM user_activity_intervals i
            WHERE i.user_id = u.id
              AND i.start_at < :window_end
              AND i.end_at > :window_start
        )",
};

/// Per tenant, users who are audit-active humans and 15-day active at the
/// same bucket. Reads the two prerequisite statistics' user rows.
pub const ACTIVE_HUMANS: CollectorQuery = CollectorQuery {
    name: "active_humans",
    output_level: RowLevel::Tenant,
    sql: "
        INSERT INTO tenant_counts (tenant_id, property, subgroup, end_time, value)
        SELECT audit.tenant_id, :property, NULL, :window_end, COUNT(*)
        FROM user_counts audit
        JOIN user_counts recent
          ON recent.user_id = audit.user_id
         AND recent.end_time = audit.end_time
         AND recent.property = '15day_actives::day'
        WHERE audit.property = 'active_users_audit:is_bot:day'
          AND audit.subgroup = 'false'
          AND audit.end_time = :window_end
        GROUP BY audit.tenant_id",
};
