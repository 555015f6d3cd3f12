//! Initial database migration.
//!
//! Creates all tables, constraints, and indexes. Enum columns are VARCHAR
//! with CHECK constraints; all primary keys are BIGSERIAL.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANCY
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 2: PROJECT GRAPH
        // ============================================================
        db.execute_unprepared(PROJECTS_SQL).await?;
        db.execute_unprepared(MILESTONES_SQL).await?;
        db.execute_unprepared(TASKS_SQL).await?;
        db.execute_unprepared(SUBTASKS_SQL).await?;
        db.execute_unprepared(PROJECT_TEAMS_SQL).await?;

        // ============================================================
        // PART 3: FINANCIALS & RISK
        // ============================================================
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(RISKS_SQL).await?;
        db.execute_unprepared(RISK_MITIGATIONS_SQL).await?;
        db.execute_unprepared(TIME_ENTRIES_SQL).await?;

        // ============================================================
        // PART 4: BILLING
        // ============================================================
        db.execute_unprepared(SUBSCRIPTIONS_SQL).await?;

        // ============================================================
        // PART 5: COLLABORATION CONTEXT
        // ============================================================
        db.execute_unprepared(STAKEHOLDERS_SQL).await?;
        db.execute_unprepared(CHANGE_REQUESTS_SQL).await?;
        db.execute_unprepared(MEETINGS_SQL).await?;
        db.execute_unprepared(DEPLOYMENTS_SQL).await?;
        db.execute_unprepared(SURVEYS_SQL).await?;
        db.execute_unprepared(ACTIVITIES_SQL).await?;
        db.execute_unprepared(DOCUMENTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    name VARCHAR(255) NOT NULL,
    role VARCHAR(20) NOT NULL DEFAULT 'contributor',
    hourly_rate NUMERIC(10, 2),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_users_role CHECK (role IN
        ('guest', 'contributor', 'reviewer', 'pm', 'admin', 'superadmin'))
);

CREATE INDEX idx_users_company ON users(company_id);
";

const PROJECTS_SQL: &str = r"
CREATE TABLE projects (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    methodology VARCHAR(50),
    start_date DATE,
    end_date DATE,
    budget NUMERIC(14, 2) NOT NULL DEFAULT 0,

    -- Seven health colors, written atomically by the analyzer
    scope_color VARCHAR(7) NOT NULL DEFAULT '#808080',
    time_color VARCHAR(7) NOT NULL DEFAULT '#808080',
    cost_color VARCHAR(7) NOT NULL DEFAULT '#808080',
    cash_flow_color VARCHAR(7) NOT NULL DEFAULT '#808080',
    safety_color VARCHAR(7) NOT NULL DEFAULT '#808080',
    risk_color VARCHAR(7) NOT NULL DEFAULT '#808080',
    quality_color VARCHAR(7) NOT NULL DEFAULT '#808080',
    last_analysis_date TIMESTAMPTZ,

    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_projects_status CHECK (status IN
        ('pending', 'in_progress', 'completed', 'on_hold'))
);

CREATE INDEX idx_projects_company ON projects(company_id);
CREATE INDEX idx_projects_status ON projects(status);
";

const MILESTONES_SQL: &str = r"
CREATE TABLE milestones (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    start_date DATE,
    end_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_milestones_status CHECK (status IN
        ('pending', 'in_progress', 'completed', 'on_hold'))
);

CREATE INDEX idx_milestones_project ON milestones(project_id);
";

const TASKS_SQL: &str = r"
CREATE TABLE tasks (
    id BIGSERIAL PRIMARY KEY,
    milestone_id BIGINT NOT NULL REFERENCES milestones(id) ON DELETE CASCADE,
    assignee_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
    title VARCHAR(255) NOT NULL,
    priority VARCHAR(20) NOT NULL DEFAULT 'medium',
    status VARCHAR(20) NOT NULL DEFAULT 'todo',
    progress INTEGER NOT NULL DEFAULT 0,
    due_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_tasks_priority CHECK (priority IN
        ('low', 'medium', 'high', 'urgent')),
    CONSTRAINT chk_tasks_status CHECK (status IN
        ('todo', 'in_progress', 'blocked', 'done')),
    CONSTRAINT chk_tasks_progress CHECK (progress BETWEEN 0 AND 100)
);

CREATE INDEX idx_tasks_milestone ON tasks(milestone_id);
CREATE INDEX idx_tasks_assignee ON tasks(assignee_id) WHERE assignee_id IS NOT NULL;
CREATE INDEX idx_tasks_due_date ON tasks(due_date) WHERE due_date IS NOT NULL;
";

const SUBTASKS_SQL: &str = r"
CREATE TABLE subtasks (
    id BIGSERIAL PRIMARY KEY,
    task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    is_completed BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_subtasks_task ON subtasks(task_id);
";

const PROJECT_TEAMS_SQL: &str = r"
CREATE TABLE project_teams (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_project_teams_member UNIQUE (project_id, user_id)
);

CREATE INDEX idx_project_teams_user ON project_teams(user_id);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    amount NUMERIC(14, 2) NOT NULL,
    expense_date DATE NOT NULL,
    category VARCHAR(100) NOT NULL DEFAULT 'general',
    status VARCHAR(10) NOT NULL DEFAULT 'pending',
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_expenses_status CHECK (status IN ('pending', 'approved', 'paid'))
);

CREATE INDEX idx_expenses_project_date ON expenses(project_id, expense_date);
";

const RISKS_SQL: &str = r"
CREATE TABLE risks (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    category VARCHAR(100) NOT NULL DEFAULT 'general',
    impact VARCHAR(10) NOT NULL DEFAULT 'medium',
    probability INTEGER NOT NULL DEFAULT 50,
    level VARCHAR(10) NOT NULL DEFAULT 'medium',
    status VARCHAR(20) NOT NULL DEFAULT 'open',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_risks_impact CHECK (impact IN ('low', 'medium', 'high')),
    CONSTRAINT chk_risks_level CHECK (level IN ('low', 'medium', 'high')),
    CONSTRAINT chk_risks_status CHECK (status IN ('open', 'mitigating', 'closed')),
    CONSTRAINT chk_risks_probability CHECK (probability BETWEEN 0 AND 100)
);

CREATE INDEX idx_risks_project ON risks(project_id);
";

const RISK_MITIGATIONS_SQL: &str = r"
CREATE TABLE risk_mitigations (
    id BIGSERIAL PRIMARY KEY,
    risk_id BIGINT NOT NULL REFERENCES risks(id) ON DELETE CASCADE,
    source VARCHAR(10) NOT NULL,
    content TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_mitigations_source CHECK (source IN ('ai', 'manual')),
    CONSTRAINT uq_mitigations_risk_source UNIQUE (risk_id, source)
);
";

const TIME_ENTRIES_SQL: &str = r"
CREATE TABLE time_entries (
    id BIGSERIAL PRIMARY KEY,
    task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    hours NUMERIC(6, 2) NOT NULL,
    hourly_rate NUMERIC(10, 2) NOT NULL DEFAULT 0,
    entry_date DATE NOT NULL,
    status VARCHAR(10) NOT NULL DEFAULT 'draft',
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_time_entries_status CHECK (status IN
        ('draft', 'submitted', 'approved', 'rejected')),
    CONSTRAINT chk_time_entries_hours CHECK (hours > 0)
);

CREATE INDEX idx_time_entries_task ON time_entries(task_id);
CREATE INDEX idx_time_entries_user_date ON time_entries(user_id, entry_date);
";

const SUBSCRIPTIONS_SQL: &str = r"
CREATE TABLE subscriptions (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    external_subscription_id VARCHAR(255) UNIQUE,
    external_customer_id VARCHAR(255),
    price_id VARCHAR(255),
    status VARCHAR(20) NOT NULL DEFAULT 'incomplete',
    cancel_at_period_end BOOLEAN NOT NULL DEFAULT false,
    current_period_start TIMESTAMPTZ,
    current_period_end TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_subscriptions_status CHECK (status IN
        ('incomplete', 'incomplete_expired', 'trialing', 'active',
         'past_due', 'unpaid', 'canceled', 'paused'))
);

-- One live subscription per company; canceled history accumulates freely.
CREATE UNIQUE INDEX uq_subscriptions_company_active
    ON subscriptions (company_id)
    WHERE status IN ('active', 'trialing', 'past_due');
";

const STAKEHOLDERS_SQL: &str = r"
CREATE TABLE stakeholders (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255),
    organization VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_stakeholders_project ON stakeholders(project_id);
";

const CHANGE_REQUESTS_SQL: &str = r"
CREATE TABLE change_requests (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    stage VARCHAR(100) NOT NULL DEFAULT 'submitted',
    requested_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_change_requests_project ON change_requests(project_id);
";

const MEETINGS_SQL: &str = r"
CREATE TABLE meetings (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    held_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_meetings_project ON meetings(project_id);
";

const DEPLOYMENTS_SQL: &str = r"
CREATE TABLE deployments (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    environment VARCHAR(50) NOT NULL DEFAULT 'production',
    is_ready BOOLEAN NOT NULL DEFAULT false,
    deployed_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_deployments_project ON deployments(project_id);
";

const SURVEYS_SQL: &str = r"
CREATE TABLE surveys (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    respondent VARCHAR(255),
    score INTEGER,
    submitted_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_surveys_score CHECK (score IS NULL OR score BETWEEN 0 AND 10)
);

CREATE INDEX idx_surveys_project ON surveys(project_id);
";

const ACTIVITIES_SQL: &str = r"
CREATE TABLE activities (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
    action VARCHAR(100) NOT NULL,
    detail TEXT,
    occurred_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_activities_project_date ON activities(project_id, occurred_on);
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE documents (
    id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    uploaded_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
    filename VARCHAR(255) NOT NULL,
    content_type VARCHAR(127) NOT NULL,
    file_size BIGINT NOT NULL DEFAULT 0,
    storage_key VARCHAR(1024) NOT NULL,
    provider VARCHAR(20) NOT NULL DEFAULT 'local',
    uploaded_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_documents_project ON documents(project_id);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_companies_updated_at BEFORE UPDATE ON companies
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_users_updated_at BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_projects_updated_at BEFORE UPDATE ON projects
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_milestones_updated_at BEFORE UPDATE ON milestones
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_tasks_updated_at BEFORE UPDATE ON tasks
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_subtasks_updated_at BEFORE UPDATE ON subtasks
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_expenses_updated_at BEFORE UPDATE ON expenses
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_risks_updated_at BEFORE UPDATE ON risks
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_subscriptions_updated_at BEFORE UPDATE ON subscriptions
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_time_entries_updated_at BEFORE UPDATE ON time_entries
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS documents, activities, surveys, deployments, meetings,
    change_requests, stakeholders, subscriptions, time_entries,
    risk_mitigations, risks, expenses, project_teams, subtasks, tasks,
    milestones, projects, users, companies CASCADE;
DROP FUNCTION IF EXISTS set_updated_at CASCADE;
";
