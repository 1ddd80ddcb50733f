//! Initial database migration.
//!
//! Creates the enums, core tables, CHECK constraints and the trigger
//! functions that keep approvals, valuations and ownership history honest.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: ASSETS & VALUATIONS
        // ============================================================
        db.execute_unprepared(ASSETS_SQL).await?;
        db.execute_unprepared(VALUE_HISTORY_SQL).await?;

        // ============================================================
        // PART 4: FRACTIONS, OFFERS & TRANSACTIONS
        // ============================================================
        db.execute_unprepared(FRACTIONS_SQL).await?;
        db.execute_unprepared(OFFERS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
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

const ENUMS_SQL: &str = r"
CREATE TYPE asset_status AS ENUM ('pending', 'approved', 'rejected');

CREATE TYPE transaction_type AS ENUM ('issue', 'transfer', 'trade');

CREATE TYPE value_source AS ENUM ('initial', 'manual_adjust', 'trade');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(50) NOT NULL,
    email VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    is_manager BOOLEAN NOT NULL DEFAULT false,
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_username_length CHECK (char_length(username) BETWEEN 3 AND 50)
);

-- Deleted accounts release their username and email
CREATE UNIQUE INDEX uq_users_username ON users(lower(username)) WHERE NOT is_deleted;
CREATE UNIQUE INDEX uq_users_email ON users(lower(email)) WHERE NOT is_deleted;
";

const ASSETS_SQL: &str = r"
CREATE TABLE assets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    description TEXT,
    total_fractions BIGINT NOT NULL,
    available_fractions BIGINT NOT NULL,
    min_units BIGINT NOT NULL DEFAULT 1,
    max_units BIGINT NOT NULL,
    submitted_value NUMERIC(19, 4) NOT NULL,
    status asset_status NOT NULL DEFAULT 'pending',
    submitted_by UUID NOT NULL REFERENCES users(id),
    approved_by UUID REFERENCES users(id),
    approved_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_total_fractions CHECK (total_fractions > 0),
    CONSTRAINT chk_available_fractions CHECK (
        available_fractions >= 0 AND available_fractions <= total_fractions
    ),
    CONSTRAINT chk_unit_limits CHECK (min_units >= 1 AND min_units <= max_units),
    CONSTRAINT chk_submitted_value CHECK (submitted_value > 0),
    CONSTRAINT chk_approved_has_approver CHECK (
        status <> 'approved' OR (approved_by IS NOT NULL AND approved_at IS NOT NULL)
    )
);

CREATE INDEX idx_assets_status ON assets(status, created_at DESC);
CREATE INDEX idx_assets_submitted_by ON assets(submitted_by);
";

const VALUE_HISTORY_SQL: &str = r"
CREATE TABLE value_history (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    asset_id UUID NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    value NUMERIC(19, 4) NOT NULL,
    source value_source NOT NULL,
    adjusted_by UUID REFERENCES users(id),
    reason TEXT,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_value_positive CHECK (value > 0)
);

CREATE INDEX idx_value_history_asset ON value_history(asset_id, recorded_at DESC);
";

const FRACTIONS_SQL: &str = r"
CREATE TABLE fractions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    asset_id UUID NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    owner_id UUID NOT NULL REFERENCES users(id),
    parent_fraction_id UUID REFERENCES fractions(id),
    quantity BIGINT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    fraction_value NUMERIC(19, 4) NOT NULL DEFAULT 0,
    owners_history JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_quantity_non_negative CHECK (quantity >= 0),
    CONSTRAINT chk_active_has_quantity CHECK (NOT is_active OR quantity > 0),
    CONSTRAINT chk_history_is_array CHECK (jsonb_typeof(owners_history) = 'array')
);

CREATE INDEX idx_fractions_asset ON fractions(asset_id) WHERE is_active;
CREATE INDEX idx_fractions_owner ON fractions(owner_id, created_at) WHERE is_active;
CREATE INDEX idx_fractions_parent ON fractions(parent_fraction_id);
";

const OFFERS_SQL: &str = r"
CREATE TABLE offers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    asset_id UUID NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id),
    is_buyer BOOLEAN NOT NULL,
    quantity BIGINT NOT NULL,
    price_per_unit NUMERIC(19, 4) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_offer_quantity CHECK (quantity > 0),
    CONSTRAINT chk_offer_price CHECK (price_per_unit > 0)
);

CREATE INDEX idx_offers_asset ON offers(asset_id, is_buyer, price_per_unit) WHERE is_active;
CREATE INDEX idx_offers_user ON offers(user_id, created_at DESC);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    asset_id UUID NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    source_fraction_id UUID REFERENCES fractions(id),
    target_fraction_id UUID NOT NULL REFERENCES fractions(id),
    from_owner_id UUID REFERENCES users(id),
    to_owner_id UUID NOT NULL REFERENCES users(id),
    quantity BIGINT NOT NULL,
    unit_price NUMERIC(19, 4),
    offer_id UUID REFERENCES offers(id),
    transaction_type transaction_type NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_quantity CHECK (quantity > 0),
    CONSTRAINT chk_source_unless_issue CHECK (
        transaction_type = 'issue'
        OR (source_fraction_id IS NOT NULL AND from_owner_id IS NOT NULL)
    ),
    CONSTRAINT chk_unit_price CHECK (unit_price IS NULL OR unit_price > 0)
);

CREATE INDEX idx_transactions_asset ON transactions(asset_id, created_at DESC);
CREATE INDEX idx_transactions_from ON transactions(from_owner_id, created_at DESC);
CREATE INDEX idx_transactions_to ON transactions(to_owner_id, created_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- Only managers may approve assets
-- ============================================================
CREATE OR REPLACE FUNCTION enforce_manager_approver()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.approved_by IS NULL THEN
        RETURN NEW;
    END IF;

    -- Re-check only when the approver is set or changed
    IF TG_OP = 'UPDATE' THEN
        IF NEW.approved_by IS NOT DISTINCT FROM OLD.approved_by THEN
            RETURN NEW;
        END IF;
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM users
        WHERE id = NEW.approved_by AND is_manager AND NOT is_deleted
    ) THEN
        RAISE EXCEPTION 'approver must be a manager'
            USING ERRCODE = 'check_violation';
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_enforce_manager_approver
BEFORE INSERT OR UPDATE ON assets
FOR EACH ROW EXECUTE FUNCTION enforce_manager_approver();

-- ============================================================
-- Only managers may adjust valuations by hand
-- ============================================================
CREATE OR REPLACE FUNCTION enforce_manager_adjuster()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.source = 'manual_adjust' AND (
        NEW.adjusted_by IS NULL OR NOT EXISTS (
            SELECT 1 FROM users
            WHERE id = NEW.adjusted_by AND is_manager AND NOT is_deleted
        )
    ) THEN
        RAISE EXCEPTION 'valuation adjuster must be a manager'
            USING ERRCODE = 'check_violation';
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_enforce_manager_adjuster
BEFORE INSERT ON value_history
FOR EACH ROW EXECUTE FUNCTION enforce_manager_adjuster();

-- ============================================================
-- Fraction value = latest value / available fractions
-- ============================================================
CREATE OR REPLACE FUNCTION compute_fraction_value(p_asset_id UUID)
RETURNS NUMERIC AS $$
DECLARE
    v_latest NUMERIC;
    v_available BIGINT;
BEGIN
    SELECT available_fractions INTO v_available FROM assets WHERE id = p_asset_id;

    SELECT value INTO v_latest
    FROM value_history
    WHERE asset_id = p_asset_id
    ORDER BY recorded_at DESC, id DESC
    LIMIT 1;

    IF v_latest IS NULL OR v_available IS NULL OR v_available = 0 THEN
        RETURN 0;
    END IF;

    RETURN ROUND(v_latest / v_available, 4);
END;
$$ LANGUAGE plpgsql STABLE;

CREATE OR REPLACE FUNCTION recompute_fraction_value_on_valuation()
RETURNS TRIGGER AS $$
BEGIN
    UPDATE fractions
    SET fraction_value = compute_fraction_value(NEW.asset_id),
        updated_at = now()
    WHERE asset_id = NEW.asset_id;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_recompute_fraction_value_on_valuation
AFTER INSERT ON value_history
FOR EACH ROW EXECUTE FUNCTION recompute_fraction_value_on_valuation();

CREATE OR REPLACE FUNCTION recompute_fraction_value_on_supply()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.available_fractions IS DISTINCT FROM OLD.available_fractions THEN
        UPDATE fractions
        SET fraction_value = compute_fraction_value(NEW.id),
            updated_at = now()
        WHERE asset_id = NEW.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_recompute_fraction_value_on_supply
AFTER UPDATE OF available_fractions ON assets
FOR EACH ROW EXECUTE FUNCTION recompute_fraction_value_on_supply();

CREATE OR REPLACE FUNCTION set_fraction_value_on_insert()
RETURNS TRIGGER AS $$
BEGIN
    NEW.fraction_value := compute_fraction_value(NEW.asset_id);
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_set_fraction_value_on_insert
BEFORE INSERT ON fractions
FOR EACH ROW EXECUTE FUNCTION set_fraction_value_on_insert();

-- ============================================================
-- owners_history is append-only
-- ============================================================
CREATE OR REPLACE FUNCTION enforce_append_only_history()
RETURNS TRIGGER AS $$
DECLARE
    v_old_len INTEGER := jsonb_array_length(OLD.owners_history);
    i INTEGER;
BEGIN
    IF jsonb_typeof(NEW.owners_history) <> 'array'
        OR jsonb_array_length(NEW.owners_history) < v_old_len THEN
        RAISE EXCEPTION 'owners_history is append-only'
            USING ERRCODE = 'check_violation';
    END IF;

    FOR i IN 0 .. v_old_len - 1 LOOP
        IF NEW.owners_history -> i IS DISTINCT FROM OLD.owners_history -> i THEN
            RAISE EXCEPTION 'owners_history is append-only'
                USING ERRCODE = 'check_violation';
        END IF;
    END LOOP;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_enforce_append_only_history
BEFORE UPDATE ON fractions
FOR EACH ROW EXECUTE FUNCTION enforce_append_only_history();

-- ============================================================
-- Ledger rows are immutable
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_transaction_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'transactions are immutable'
        USING ERRCODE = 'check_violation';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_transaction_modification
BEFORE UPDATE OR DELETE ON transactions
FOR EACH ROW EXECUTE FUNCTION prevent_transaction_modification();

CREATE OR REPLACE FUNCTION prevent_value_history_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'value history is append-only'
        USING ERRCODE = 'check_violation';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_value_history_modification
BEFORE UPDATE OR DELETE ON value_history
FOR EACH ROW EXECUTE FUNCTION prevent_value_history_modification();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_value_history_modification ON value_history;
DROP TRIGGER IF EXISTS trg_prevent_transaction_modification ON transactions;
DROP TRIGGER IF EXISTS trg_enforce_append_only_history ON fractions;
DROP TRIGGER IF EXISTS trg_set_fraction_value_on_insert ON fractions;
DROP TRIGGER IF EXISTS trg_recompute_fraction_value_on_supply ON assets;
DROP TRIGGER IF EXISTS trg_recompute_fraction_value_on_valuation ON value_history;
DROP TRIGGER IF EXISTS trg_enforce_manager_adjuster ON value_history;
DROP TRIGGER IF EXISTS trg_enforce_manager_approver ON assets;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_value_history_modification();
DROP FUNCTION IF EXISTS prevent_transaction_modification();
DROP FUNCTION IF EXISTS enforce_append_only_history();
DROP FUNCTION IF EXISTS set_fraction_value_on_insert();
DROP FUNCTION IF EXISTS recompute_fraction_value_on_supply();
DROP FUNCTION IF EXISTS recompute_fraction_value_on_valuation();
DROP FUNCTION IF EXISTS compute_fraction_value(UUID);
DROP FUNCTION IF EXISTS enforce_manager_adjuster();
DROP FUNCTION IF EXISTS enforce_manager_approver();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS offers CASCADE;
DROP TABLE IF EXISTS fractions CASCADE;
DROP TABLE IF EXISTS value_history CASCADE;
DROP TABLE IF EXISTS assets CASCADE;
DROP TABLE IF EXISTS users CASCADE;

-- Drop enums
DROP TYPE IF EXISTS value_source;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS asset_status;
";
