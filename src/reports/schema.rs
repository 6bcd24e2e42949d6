//! CRM schema description for prompt construction.

/// Schema description handed to the SQL generator.
///
/// Covers the tenant-scoped entity tables reports may query. Every table
/// carries a `tenant_id` column; row-level security filters on it.
pub fn schema_description() -> &'static str {
    SCHEMA_DESCRIPTION
}

const SCHEMA_DESCRIPTION: &str = r#"-- CRM Database Schema
-- Tables with tenant isolation (tenant_id column)

-- Contacts table
CREATE TABLE contacts (
  id UUID PRIMARY KEY,
  tenant_id UUID NOT NULL,
  first_name VARCHAR(255) NOT NULL,
  last_name VARCHAR(255) NOT NULL,
  email VARCHAR(255),
  phone VARCHAR(255),
  address TEXT,
  score INTEGER DEFAULT 0,
  lifetime_value DECIMAL(12,2) DEFAULT 0,
  stage VARCHAR(50) DEFAULT 'identified',
  custom JSONB DEFAULT '{}',
  created_at TIMESTAMP DEFAULT NOW(),
  updated_at TIMESTAMP DEFAULT NOW()
);

-- Donations table
CREATE TABLE donations (
  id UUID PRIMARY KEY,
  tenant_id UUID NOT NULL,
  contact_id UUID REFERENCES contacts(id),
  organization_id UUID REFERENCES organizations(id),
  campaign_id UUID REFERENCES campaigns(id),
  amount DECIMAL(12,2) NOT NULL,
  currency VARCHAR(3) DEFAULT 'USD',
  date DATE NOT NULL,
  thank_you_status VARCHAR(20) DEFAULT 'none',
  custom JSONB DEFAULT '{}',
  created_at TIMESTAMP DEFAULT NOW(),
  updated_at TIMESTAMP DEFAULT NOW()
);

-- Organizations table
CREATE TABLE organizations (
  id UUID PRIMARY KEY,
  tenant_id UUID NOT NULL,
  name VARCHAR(255) NOT NULL,
  type VARCHAR(50) NOT NULL,
  website VARCHAR(255),
  location VARCHAR(255),
  custom JSONB DEFAULT '{}',
  created_at TIMESTAMP DEFAULT NOW(),
  updated_at TIMESTAMP DEFAULT NOW()
);

-- Campaigns table
CREATE TABLE campaigns (
  id UUID PRIMARY KEY,
  tenant_id UUID NOT NULL,
  name VARCHAR(255) NOT NULL,
  target_amount DECIMAL(12,2) NOT NULL,
  start_date DATE NOT NULL,
  end_date DATE NOT NULL,
  custom JSONB DEFAULT '{}',
  created_at TIMESTAMP DEFAULT NOW(),
  updated_at TIMESTAMP DEFAULT NOW()
);

-- Grant applications table
CREATE TABLE grant_apps (
  id UUID PRIMARY KEY,
  tenant_id UUID NOT NULL,
  organization_id UUID REFERENCES organizations(id),
  name VARCHAR(255) NOT NULL,
  amount_requested DECIMAL(12,2) NOT NULL,
  status VARCHAR(50) NOT NULL,
  deadline DATE NOT NULL,
  notes TEXT,
  custom JSONB DEFAULT '{}',
  created_at TIMESTAMP DEFAULT NOW(),
  updated_at TIMESTAMP DEFAULT NOW()
);

-- Pipeline events table
CREATE TABLE pipeline_events (
  id UUID PRIMARY KEY,
  tenant_id UUID NOT NULL,
  contact_id UUID REFERENCES contacts(id),
  stage VARCHAR(50) NOT NULL,
  note TEXT,
  occurred_at TIMESTAMP NOT NULL,
  created_at TIMESTAMP DEFAULT NOW(),
  updated_at TIMESTAMP DEFAULT NOW()
);

-- Staff table
CREATE TABLE staff (
  id UUID PRIMARY KEY,
  tenant_id UUID NOT NULL,
  name VARCHAR(255) NOT NULL,
  role VARCHAR(255) NOT NULL,
  email VARCHAR(255),
  phone VARCHAR(255),
  team VARCHAR(50) NOT NULL,
  custom JSONB DEFAULT '{}',
  created_at TIMESTAMP DEFAULT NOW(),
  updated_at TIMESTAMP DEFAULT NOW()
);
"#;
