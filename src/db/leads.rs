use chrono::Utc;
use rusqlite::{params, params_from_iter, OptionalExtension};

use super::types::{blank_to_none, enum_col, ts_col, ts_to_sql};
use super::{DbError, LocalDb};
use crate::types::{Lead, LeadStatus, NewLead};

const LEAD_COLUMNS: &str = "leads.id, leads.name, leads.email, leads.phone, leads.company,
    leads.status, leads.value, leads.source, leads.notes, leads.assigned_to,
    p.full_name AS assignee_name, leads.created_by, leads.created_at";

impl LocalDb {
    // =========================================================================
    // Leads
    // =========================================================================

    fn map_lead_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
        Ok(Lead {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            company: row.get(4)?,
            status: enum_col(row, 5)?,
            value: row.get(6)?,
            source: row.get(7)?,
            notes: row.get(8)?,
            assigned_to: row.get(9)?,
            assignee_name: row.get(10)?,
            created_by: row.get(11)?,
            created_at: ts_col(row, 12)?,
        })
    }

    pub fn insert_lead(&self, id: &str, lead: &NewLead) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO leads (id, name, email, phone, company, status, value, source, notes,
                                assigned_to, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                lead.name,
                blank_to_none(lead.email.as_deref()),
                blank_to_none(lead.phone.as_deref()),
                blank_to_none(lead.company.as_deref()),
                lead.status.as_str(),
                lead.value,
                blank_to_none(lead.source.as_deref()),
                blank_to_none(lead.notes.as_deref()),
                blank_to_none(lead.assigned_to.as_deref()),
                lead.created_by,
                ts_to_sql(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// All leads with the assignee's name, newest first.
    pub fn get_leads_newest_first(&self) -> Result<Vec<Lead>, DbError> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS}
             FROM leads
             LEFT JOIN profiles p ON leads.assigned_to = p.id
             ORDER BY leads.created_at DESC, leads.rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_lead_row)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    pub fn get_lead(&self, id: &str) -> Result<Option<Lead>, DbError> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS}
             FROM leads
             LEFT JOIN profiles p ON leads.assigned_to = p.id
             WHERE leads.id = ?1"
        );
        let lead = self
            .conn
            .query_row(&sql, params![id], Self::map_lead_row)
            .optional()?;
        Ok(lead)
    }

    /// Point every listed lead at one assignee in a single statement.
    /// Returns the number of rows changed; unknown ids are skipped.
    pub fn assign_leads(&self, ids: &[String], assignee: &str) -> Result<usize, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE leads SET assigned_to = ? WHERE id IN ({placeholders})"
        );
        let args = std::iter::once(assignee).chain(ids.iter().map(String::as_str));
        let changed = self.conn.execute(&sql, params_from_iter(args))?;
        Ok(changed)
    }

    pub fn update_lead_status(&self, id: &str, status: LeadStatus) -> Result<usize, DbError> {
        let changed = self.conn.execute(
            "UPDATE leads SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(changed)
    }

    /// Count leads assigned to one member, optionally narrowed to one status.
    pub fn count_leads(
        &self,
        assignee: &str,
        status: Option<LeadStatus>,
    ) -> Result<usize, DbError> {
        let count: i64 = match status {
            Some(status) => self.conn.query_row(
                "SELECT COUNT(*) FROM leads WHERE assigned_to = ?1 AND status = ?2",
                params![assignee, status.as_str()],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT COUNT(*) FROM leads WHERE assigned_to = ?1",
                params![assignee],
                |row| row.get(0),
            )?,
        };
        Ok(count as usize)
    }
}
