use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::types::{blank_to_none, enum_col, ts_col, ts_to_sql};
use super::{DbError, LocalDb};
use crate::types::{LeadRef, NewReminder, Reminder};

impl LocalDb {
    // =========================================================================
    // Reminders
    // =========================================================================

    fn map_reminder_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reminder> {
        let lead_name: Option<String> = row.get(10)?;
        let lead_company: Option<String> = row.get(11)?;
        Ok(Reminder {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            due_date: ts_col(row, 3)?,
            priority: enum_col(row, 4)?,
            completed: row.get(5)?,
            lead_id: row.get(6)?,
            assigned_to: row.get(7)?,
            created_by: row.get(8)?,
            created_at: ts_col(row, 9)?,
            lead: lead_name.map(|name| LeadRef {
                name,
                company: lead_company,
            }),
        })
    }

    pub fn insert_reminder(&self, id: &str, reminder: &NewReminder) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO reminders (id, title, description, due_date, priority, completed,
                                    lead_id, assigned_to, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9)",
            params![
                id,
                reminder.title,
                blank_to_none(reminder.description.as_deref()),
                ts_to_sql(&reminder.due_date),
                reminder.priority.as_str(),
                blank_to_none(reminder.lead_id.as_deref()),
                reminder.assigned_to,
                reminder.created_by,
                ts_to_sql(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// All reminders with their linked lead, soonest due first.
    pub fn get_reminders_by_due_date(&self) -> Result<Vec<Reminder>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.title, r.description, r.due_date, r.priority, r.completed,
                    r.lead_id, r.assigned_to, r.created_by, r.created_at,
                    l.name, l.company
             FROM reminders r
             LEFT JOIN leads l ON r.lead_id = l.id
             ORDER BY r.due_date ASC",
        )?;
        let rows = stmt.query_map([], Self::map_reminder_row)?;

        let mut reminders = Vec::new();
        for row in rows {
            reminders.push(row?);
        }
        Ok(reminders)
    }

    pub fn get_reminder(&self, id: &str) -> Result<Option<Reminder>, DbError> {
        let reminder = self
            .conn
            .query_row(
                "SELECT r.id, r.title, r.description, r.due_date, r.priority, r.completed,
                        r.lead_id, r.assigned_to, r.created_by, r.created_at,
                        l.name, l.company
                 FROM reminders r
                 LEFT JOIN leads l ON r.lead_id = l.id
                 WHERE r.id = ?1",
                params![id],
                Self::map_reminder_row,
            )
            .optional()?;
        Ok(reminder)
    }

    pub fn set_reminder_completed(&self, id: &str, completed: bool) -> Result<usize, DbError> {
        let changed = self.conn.execute(
            "UPDATE reminders SET completed = ?1 WHERE id = ?2",
            params![completed, id],
        )?;
        Ok(changed)
    }
}
